//! The contract every reader driver implements, and UID folding.

use core::fmt;

/// Longest UID an ISO14443A card reports (triple size).
pub const MAX_UID_LEN: usize = 10;

/// Raw card UID as the reader reported it: 4, 7 or 10 bytes.
pub type Uid = heapless::Vec<u8, MAX_UID_LEN>;

/// Card families a passive target poll can look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFamily {
    /// 106 kbps type A: MIFARE Classic, Ultralight, NTAG.
    Iso14443a,
}

impl CardFamily {
    /// Baud rate / modulation byte used by InListPassiveTarget.
    pub fn baud_code(self) -> u8 {
        match self {
            CardFamily::Iso14443a => 0x00,
        }
    }
}

/// Firmware response of a PN53x: IC, version, revision, support flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion(pub u32);

impl FirmwareVersion {
    pub fn ic(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn major(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn minor(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn support(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PN5{:x} firmware {}.{}", self.ic(), self.major(), self.minor())
    }
}

/// A contactless reader on the bus.
///
/// Every call blocks until the reader answers or the driver gives up.
pub trait TagReader {
    type Error: fmt::Debug;

    /// Wake the chip after power-up.
    fn begin(&mut self) -> Result<(), Self::Error>;

    fn firmware_version(&mut self) -> Result<FirmwareVersion, Self::Error>;

    /// Put the secure access module in normal mode.
    fn sam_config(&mut self) -> Result<(), Self::Error>;

    /// Bound how many activation attempts one passive poll makes.
    fn set_passive_activation_retries(&mut self, retries: u8) -> Result<(), Self::Error>;

    /// Poll once for a card of `family`; `None` if nothing is in the field.
    fn read_passive_target(&mut self, family: CardFamily) -> Result<Option<Uid>, Self::Error>;
}

/// Fold a UID into the identifier compared against the accepted tags.
///
/// Only 4-byte UIDs are decoded, most significant byte first. Longer UIDs
/// read as 0, the same as an empty reader.
pub fn decode_uid(uid: &[u8]) -> u32 {
    match <[u8; 4]>::try_from(uid) {
        Ok(bytes) => u32::from_be_bytes(bytes),
        Err(_) => 0,
    }
}
