//! Build-time configuration of the gadget.
//!
//! There is no runtime configuration. Change the tables below and reflash.

/// Number of readers on the bus.
pub const READER_COUNT: usize = 8;

// Shared SPI bus pins
pub const PN532_SCK_PIN: u8 = 13;
pub const PN532_MISO_PIN: u8 = 12;
pub const PN532_MOSI_PIN: u8 = 11;

/// Pause after every reader poll so the bus and the PN532 can settle.
pub const SETTLE_DELAY_MS: u32 = 1000;

// PWM levels for the lock output: locked (LOW) and opened (HIGH)
pub const PWM_LOCKED_LEVEL: u16 = 0;
pub const PWM_UNLOCKED_LEVEL: u16 = 255;
pub const PWM_FULL_SCALE: u16 = 255;

/// Ticks counted down (and logged) before the outputs switch to unlocked.
pub const COUNTDOWN_TICKS: u8 = 4;

/// Firmware-version retries allowed per reader during startup.
pub const STARTUP_RETRY: RetryPolicy = RetryPolicy::Forever;

/// Whether a full match actually unlocks the gadget.
pub const UNLOCK_TRIGGER: UnlockTrigger = UnlockTrigger::Disarmed;

/// One reader position on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConfig {
    /// GPIO driving this reader's chip-select line.
    pub chip_select: u8,
    /// Tag that satisfies this slot.
    pub accepted_tag: u32,
}

impl SlotConfig {
    pub const fn new(chip_select: u8, accepted_tag: u32) -> Self {
        Self {
            chip_select,
            accepted_tag,
        }
    }
}

/// Chip-select pin and accepted tag for every reader, in slot order.
///
/// Slot 3 accepts tag 0, which is also what an empty reader reads, so it is
/// satisfied whenever no card is on it.
pub const SLOTS: [SlotConfig; READER_COUNT] = [
    SlotConfig::new(3, 3_872_679_160),
    SlotConfig::new(4, 3_584_511_166),
    SlotConfig::new(5, 3_584_511_167),
    SlotConfig::new(6, 0),
    SlotConfig::new(7, 3_872_679_160),
    SlotConfig::new(8, 3_872_679_160),
    SlotConfig::new(9, 3_872_679_160),
    SlotConfig::new(10, 3_872_679_160),
];

/// How long startup keeps asking a reader for its firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Keep asking until the reader answers. A missing reader hangs startup.
    Forever,
    /// Give up after this many failed queries and report the slot.
    Attempts(u32),
}

impl RetryPolicy {
    /// Whether another query is allowed after `failures` failed ones.
    pub fn allows_retry(self, failures: u32) -> bool {
        match self {
            RetryPolicy::Forever => true,
            RetryPolicy::Attempts(max) => failures < max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockTrigger {
    /// Full matches are counted and reported, nothing else happens.
    Disarmed,
    /// A full match unlocks the gadget and runs the output countdown.
    Armed,
}
