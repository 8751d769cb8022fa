//! Per-iteration tag matching and the lock state it feeds.

use embedded_hal::delay::DelayNs;

use crate::reader::TagReader;
use crate::readers::ReaderArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl LockState {
    pub fn is_locked(self) -> bool {
        self == LockState::Locked
    }

    /// Locked becomes Unlocked once every slot matched in the same poll.
    /// Nothing relocks the gadget.
    pub fn after_poll<const N: usize>(self, report: &PollReport<N>) -> LockState {
        match self {
            LockState::Locked if report.all_matched() => LockState::Unlocked,
            state => state,
        }
    }
}

/// What one polling iteration saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport<const N: usize> {
    /// Identifier read from each slot, 0 for none.
    pub reads: [u32; N],
    /// Slots whose read equals their accepted tag.
    pub matches: usize,
}

impl<const N: usize> PollReport<N> {
    pub fn new(reads: [u32; N], accepted: &[u32; N]) -> Self {
        Self {
            matches: count_matches(&reads, accepted),
            reads,
        }
    }

    pub fn all_matched(&self) -> bool {
        self.matches == N
    }
}

/// Count positions where `reads[i] == accepted[i]`.
///
/// Plain equality: an accepted tag of 0 matches a slot that read nothing.
pub fn count_matches(reads: &[u32], accepted: &[u32]) -> usize {
    reads
        .iter()
        .zip(accepted)
        .filter(|(read, accepted)| read == accepted)
        .count()
}

/// Sample every slot once, in index order, and count the matches.
///
/// Only runs while `state` is locked; returns `None` otherwise. Nothing is
/// carried over from earlier iterations.
pub fn evaluate_once<R, D, const N: usize>(
    readers: &mut ReaderArray<R, D, N>,
    state: LockState,
) -> Option<PollReport<N>>
where
    R: TagReader,
    D: DelayNs,
{
    if !state.is_locked() {
        return None;
    }

    let mut reads = [0u32; N];
    for (index, read) in reads.iter_mut().enumerate() {
        // index < N, so sampling cannot fail
        *read = readers.sample_slot(index).unwrap_or(0);
    }
    Some(PollReport::new(reads, &readers.accepted_tags()))
}
