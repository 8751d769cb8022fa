//! The main loop over the production slot table, with simulated readers.

use rfid_gadget::config::{READER_COUNT, SLOTS, STARTUP_RETRY, UNLOCK_TRIGGER};
use rfid_gadget::sim::{InstantDelay, SimOutputs, SimReader};
use rfid_gadget::{
    Gadget, GadgetError, LockIndicator, LockState, ReaderArray, StepOutcome, UnlockTrigger,
};

type SimGadget = Gadget<SimReader, InstantDelay, SimOutputs, READER_COUNT>;

fn build(trigger: UnlockTrigger) -> SimGadget {
    let readers = ReaderArray::new(
        core::array::from_fn(|_| SimReader::new()),
        &SLOTS,
        InstantDelay,
    );
    let mut gadget = Gadget::new(readers, SimOutputs::default(), trigger);
    gadget.start(STARTUP_RETRY).unwrap();
    gadget
}

/// Place every accepted tag; slots accepting 0 stay empty.
fn place_accepted(gadget: &mut SimGadget) {
    for (i, slot) in SLOTS.iter().enumerate() {
        let reader = gadget.readers_mut().slot_mut(i).unwrap().reader_mut();
        match slot.accepted_tag {
            0 => reader.remove(),
            tag => reader.place_tag(tag),
        }
    }
}

fn report(outcome: StepOutcome<READER_COUNT>) -> rfid_gadget::PollReport<READER_COUNT> {
    match outcome {
        StepOutcome::Polled(report) | StepOutcome::Unlocked(report) => report,
        StepOutcome::Idle => panic!("gadget did not poll"),
    }
}

#[test]
fn empty_readers_only_satisfy_the_zero_slot() {
    let mut gadget = build(UNLOCK_TRIGGER);
    let report = report(gadget.step().unwrap());
    assert_eq!(report.reads, [0; READER_COUNT]);
    assert_eq!(report.matches, 1);
}

#[test]
fn full_match_is_reported_but_inert_by_default() {
    let mut gadget = build(UNLOCK_TRIGGER);
    place_accepted(&mut gadget);
    for _ in 0..3 {
        let report = report(gadget.step().unwrap());
        assert!(report.all_matched());
    }
    assert_eq!(gadget.lock_state(), LockState::Locked);
    assert!(!gadget.outputs().unlocked);
}

#[test]
fn armed_gadget_unlocks_once_every_tag_is_in_place() {
    let mut gadget = build(UnlockTrigger::Armed);
    place_accepted(&mut gadget);
    gadget.readers_mut().slot_mut(5).unwrap().reader_mut().remove();
    assert_eq!(report(gadget.step().unwrap()).matches, READER_COUNT - 1);

    gadget
        .readers_mut()
        .slot_mut(5)
        .unwrap()
        .reader_mut()
        .place_tag(SLOTS[5].accepted_tag);
    assert!(matches!(gadget.step().unwrap(), StepOutcome::Unlocked(_)));
    assert!(gadget.outputs().unlocked);
    assert_eq!(gadget.step().unwrap(), StepOutcome::Idle);
}

#[test]
fn swapped_tags_do_not_match() {
    let mut gadget = build(UnlockTrigger::Armed);
    place_accepted(&mut gadget);
    gadget
        .readers_mut()
        .slot_mut(1)
        .unwrap()
        .reader_mut()
        .place_tag(SLOTS[2].accepted_tag);
    gadget
        .readers_mut()
        .slot_mut(2)
        .unwrap()
        .reader_mut()
        .place_tag(SLOTS[1].accepted_tag);
    assert_eq!(report(gadget.step().unwrap()).matches, READER_COUNT - 2);
    assert_eq!(gadget.lock_state(), LockState::Locked);
}

/// Lock outputs whose unlock write never reaches the hardware.
#[derive(Default)]
struct StuckOutputs {
    unlock_attempts: u32,
}

impl LockIndicator for StuckOutputs {
    fn show_locked(&mut self) -> Result<(), GadgetError> {
        Ok(())
    }

    fn blink(&mut self, _on: bool) -> Result<(), GadgetError> {
        Ok(())
    }

    fn show_unlocked(&mut self) -> Result<(), GadgetError> {
        self.unlock_attempts += 1;
        Err(GadgetError::OutputFault)
    }
}

#[test]
fn stuck_lock_output_keeps_polling_and_retrying() {
    let readers = ReaderArray::new(
        core::array::from_fn(|_| SimReader::new()),
        &SLOTS,
        InstantDelay,
    );
    let mut gadget = Gadget::new(readers, StuckOutputs::default(), UnlockTrigger::Armed);
    gadget.start(STARTUP_RETRY).unwrap();
    for (i, slot) in SLOTS.iter().enumerate() {
        if slot.accepted_tag != 0 {
            let reader = gadget.readers_mut().slot_mut(i).unwrap().reader_mut();
            reader.place_tag(slot.accepted_tag);
        }
    }

    for _ in 0..3 {
        assert_eq!(gadget.step(), Err(GadgetError::OutputFault));
        assert_eq!(gadget.lock_state(), LockState::Locked);
    }
    assert_eq!(gadget.outputs().unlock_attempts, 3);
    assert_eq!(gadget.readers().slot(0).unwrap().reader().polls(), 3);
}
