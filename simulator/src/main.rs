//! RFID gadget PC simulator
//!
//! Runs the gadget main loop on the desktop against simulated readers.
//!
//! # Usage
//! ```bash
//! # Three polls with empty readers
//! cargo run -p rfid-gadget-simulator
//!
//! # Every accepted tag in place, unlock trigger armed, no settle delay
//! cargo run -p rfid-gadget-simulator -- --present --arm --fast
//! ```
//!
//! # Flags
//! - `--present`: place every accepted tag on its reader
//! - `--arm`: let a full match unlock the gadget
//! - `--fast`: skip the settle delay between polls
//! - `--cycles=N`: number of loop passes (default 3)

use std::thread;
use std::time::Duration;

use anyhow::Context;
use embedded_hal::delay::DelayNs;
use log::info;
use rfid_gadget::config::{READER_COUNT, SETTLE_DELAY_MS, SLOTS, STARTUP_RETRY, UNLOCK_TRIGGER};
use rfid_gadget::sim::{SimOutputs, SimReader};
use rfid_gadget::{Gadget, ReaderArray, StepOutcome, UnlockTrigger};

const DEFAULT_CYCLES: u32 = 3;

/// Blocking delay on the host clock.
#[derive(Debug, Default, Clone, Copy)]
struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

struct Options {
    present: bool,
    trigger: UnlockTrigger,
    settle_ms: u32,
    cycles: u32,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let cycles = match args.iter().find_map(|a| a.strip_prefix("--cycles=")) {
        Some(n) => n
            .parse()
            .with_context(|| format!("invalid --cycles value {n:?}"))?,
        None => DEFAULT_CYCLES,
    };
    Ok(Options {
        present: args.iter().any(|a| a == "--present"),
        trigger: if args.iter().any(|a| a == "--arm") {
            UnlockTrigger::Armed
        } else {
            UNLOCK_TRIGGER
        },
        settle_ms: if args.iter().any(|a| a == "--fast") {
            0
        } else {
            SETTLE_DELAY_MS
        },
        cycles,
    })
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    info!("Welcome to the Escape Room RFID Gadget v{}!", env!("CARGO_PKG_VERSION"));
    info!("Simulating {} readers, trigger {:?}", READER_COUNT, options.trigger);

    let mut readers: [SimReader; READER_COUNT] = core::array::from_fn(|_| SimReader::new());
    if options.present {
        for (reader, slot) in readers.iter_mut().zip(SLOTS.iter()) {
            if slot.accepted_tag != 0 {
                reader.place_tag(slot.accepted_tag);
            }
        }
    }

    let readers = ReaderArray::new(readers, &SLOTS, HostDelay).with_settle_delay(options.settle_ms);
    let mut gadget = Gadget::new(readers, SimOutputs::default(), options.trigger);
    gadget.start(STARTUP_RETRY)?;

    for cycle in 1..=options.cycles {
        match gadget.step()? {
            StepOutcome::Idle => info!("Cycle {cycle}: unlocked, idle"),
            StepOutcome::Polled(report) => {
                info!("Cycle {cycle}: reads {:?}", report.reads);
            }
            StepOutcome::Unlocked(report) => {
                info!("Cycle {cycle}: reads {:?} -> UNLOCKED", report.reads);
            }
        }
    }

    info!("Final lock state: {:?}", gadget.lock_state());
    Ok(())
}
