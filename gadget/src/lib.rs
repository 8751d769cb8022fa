//! Reader polling and tag matching core for the escape room RFID gadget.
//!
//! An array of PN532 readers shares one SPI bus, each on its own chip-select
//! line. Every loop iteration samples each reader once, in slot order, folds
//! the card UID into a `u32` and counts the slots whose read equals the
//! accepted tag configured for that slot.
//!
//! Hardware is reached only through `embedded-hal` traits, so the same loop
//! runs on the ESP32 firmware and in the desktop simulator.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log_macros;

pub mod config;
pub mod error;
pub mod gadget;
pub mod matcher;
pub mod nfc;
pub mod outputs;
pub mod reader;
pub mod readers;
pub mod sim;

pub use crate::config::{RetryPolicy, SlotConfig, UnlockTrigger};
pub use crate::error::GadgetError;
pub use crate::gadget::{Gadget, StepOutcome};
pub use crate::matcher::{count_matches, evaluate_once, LockState, PollReport};
pub use crate::nfc::{Pn532Error, Pn532Reader, PollTimer};
pub use crate::outputs::{count_down_and_unlock, LockIndicator, LockOutputs};
pub use crate::reader::{decode_uid, CardFamily, FirmwareVersion, TagReader, Uid};
pub use crate::readers::{ReaderArray, ReaderSlot};
