//! Simulated readers, used by the desktop simulator and the tests.

use embedded_hal::delay::DelayNs;

use crate::error::GadgetError;
use crate::outputs::LockIndicator;
use crate::reader::{CardFamily, FirmwareVersion, TagReader, Uid, MAX_UID_LEN};

/// What a PN532 v1.6 answers to GetFirmwareVersion.
pub const SIM_FIRMWARE: FirmwareVersion = FirmwareVersion(0x3201_0607);

/// Delay that returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantDelay;

impl DelayNs for InstantDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Read failure of a [`SimReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    /// The reader is not answering yet.
    NoResponse,
    /// The next poll fails as if the frame was corrupted.
    Glitch,
}

/// A reader with a card that can be placed and removed at will.
#[derive(Debug, Clone)]
pub struct SimReader {
    card: Option<Uid>,
    silent_queries: u32,
    glitch_next: bool,
    configured: bool,
    retries: Option<u8>,
    polls: u32,
}

impl SimReader {
    pub fn new() -> Self {
        Self {
            card: None,
            silent_queries: 0,
            glitch_next: false,
            configured: false,
            retries: None,
            polls: 0,
        }
    }

    /// Ignore the first `queries` firmware-version queries.
    pub fn silent_for(mut self, queries: u32) -> Self {
        self.silent_queries = queries;
        self
    }

    /// Put a card with this UID on the reader. UIDs over 10 bytes are cut.
    pub fn place(&mut self, uid: &[u8]) {
        let len = uid.len().min(MAX_UID_LEN);
        self.card = Uid::from_slice(&uid[..len]).ok();
    }

    /// Put a 4-byte card whose identifier folds to `tag`.
    pub fn place_tag(&mut self, tag: u32) {
        self.place(&tag.to_be_bytes());
    }

    pub fn remove(&mut self) {
        self.card = None;
    }

    /// Make the next poll fail.
    pub fn glitch(&mut self) {
        self.glitch_next = true;
    }

    /// Passive polls made so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// SAM configured and retries set, as startup leaves a reader.
    pub fn is_ready(&self) -> bool {
        self.configured && self.retries.is_some()
    }

    pub fn activation_retries(&self) -> Option<u8> {
        self.retries
    }
}

impl Default for SimReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for SimReader {
    type Error = SimFault;

    fn begin(&mut self) -> Result<(), SimFault> {
        Ok(())
    }

    fn firmware_version(&mut self) -> Result<FirmwareVersion, SimFault> {
        if self.silent_queries > 0 {
            self.silent_queries -= 1;
            return Err(SimFault::NoResponse);
        }
        Ok(SIM_FIRMWARE)
    }

    fn sam_config(&mut self) -> Result<(), SimFault> {
        self.configured = true;
        Ok(())
    }

    fn set_passive_activation_retries(&mut self, retries: u8) -> Result<(), SimFault> {
        self.retries = Some(retries);
        Ok(())
    }

    fn read_passive_target(&mut self, _family: CardFamily) -> Result<Option<Uid>, SimFault> {
        self.polls += 1;
        if core::mem::take(&mut self.glitch_next) {
            return Err(SimFault::Glitch);
        }
        Ok(self.card.clone())
    }
}

/// Lock outputs that only remember their last state.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimOutputs {
    pub unlocked: bool,
    pub blinks: u32,
}

impl LockIndicator for SimOutputs {
    fn show_locked(&mut self) -> Result<(), GadgetError> {
        self.unlocked = false;
        Ok(())
    }

    fn blink(&mut self, on: bool) -> Result<(), GadgetError> {
        if on {
            self.blinks += 1;
        }
        Ok(())
    }

    fn show_unlocked(&mut self) -> Result<(), GadgetError> {
        self.unlocked = true;
        Ok(())
    }
}
