//! The gadget main loop: poll, match, and (when armed) unlock.

use embedded_hal::delay::DelayNs;

use crate::config::{RetryPolicy, UnlockTrigger, COUNTDOWN_TICKS};
use crate::error::GadgetError;
use crate::matcher::{evaluate_once, LockState, PollReport};
use crate::outputs::{count_down_and_unlock, LockIndicator};
use crate::reader::TagReader;
use crate::readers::ReaderArray;

/// Result of one [`Gadget::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome<const N: usize> {
    /// Already unlocked, nothing was polled.
    Idle,
    Polled(PollReport<N>),
    /// This poll unlocked the gadget and the countdown has run.
    Unlocked(PollReport<N>),
}

pub struct Gadget<R, D, O, const N: usize> {
    readers: ReaderArray<R, D, N>,
    outputs: O,
    lock: LockState,
    trigger: UnlockTrigger,
}

impl<R, D, O, const N: usize> Gadget<R, D, O, N>
where
    R: TagReader,
    D: DelayNs,
    O: LockIndicator,
{
    pub fn new(readers: ReaderArray<R, D, N>, outputs: O, trigger: UnlockTrigger) -> Self {
        Self {
            readers,
            outputs,
            lock: LockState::Locked,
            trigger,
        }
    }

    /// Show the locked state, then bring up every reader.
    pub fn start(&mut self, policy: RetryPolicy) -> Result<(), GadgetError> {
        self.outputs.show_locked()?;
        self.readers.initialize(policy)
    }

    /// One pass of the main loop.
    pub fn step(&mut self) -> Result<StepOutcome<N>, GadgetError> {
        let Some(report) = evaluate_once(&mut self.readers, self.lock) else {
            return Ok(StepOutcome::Idle);
        };
        diag!(info, "{}/{} readers matched", report.matches, N);

        if self.trigger == UnlockTrigger::Disarmed {
            return Ok(StepOutcome::Polled(report));
        }
        let next = self.lock.after_poll(&report);
        if next == self.lock {
            return Ok(StepOutcome::Polled(report));
        }

        // Stay locked until the outputs show it, so a failed write is
        // retried on the next full match
        let tick_ms = self.readers.settle_delay_ms();
        count_down_and_unlock(
            &mut self.outputs,
            self.readers.delay_mut(),
            COUNTDOWN_TICKS,
            tick_ms,
        )?;
        self.lock = next;
        diag!(info, "All tags in place, gadget unlocked");
        Ok(StepOutcome::Unlocked(report))
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn readers(&self) -> &ReaderArray<R, D, N> {
        &self.readers
    }

    pub fn readers_mut(&mut self) -> &mut ReaderArray<R, D, N> {
        &mut self.readers
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }
}
