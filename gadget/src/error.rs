use thiserror::Error;

/// Errors surfaced by the reader array and the lock outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GadgetError {
    #[error("slot {index} out of range ({count} readers)")]
    SlotOutOfRange { index: usize, count: usize },

    #[error("reader in slot {slot} did not answer after {attempts} firmware queries")]
    ReaderUnresponsive { slot: usize, attempts: u32 },

    #[error("lock output pin or PWM channel failed")]
    OutputFault,
}
