//! The reader array: one slot per PN532 on the bus.

use embedded_hal::delay::DelayNs;

use crate::config::{RetryPolicy, SlotConfig, SETTLE_DELAY_MS};
use crate::error::GadgetError;
use crate::reader::{decode_uid, CardFamily, FirmwareVersion, TagReader};

/// Passive activation attempts per poll. One keeps an empty reader from
/// stalling the loop.
const PASSIVE_ACTIVATION_RETRIES: u8 = 1;

/// A reader, where it sits on the bus, and what it last saw.
#[derive(Debug)]
pub struct ReaderSlot<R> {
    index: usize,
    config: SlotConfig,
    last_read: u32,
    reader: R,
}

impl<R> ReaderSlot<R> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn chip_select(&self) -> u8 {
        self.config.chip_select
    }

    pub fn accepted_tag(&self) -> u32 {
        self.config.accepted_tag
    }

    /// Identifier from the latest poll, 0 if nothing readable was there.
    pub fn last_read(&self) -> u32 {
        self.last_read
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

/// `N` readers sharing one bus, polled one at a time.
pub struct ReaderArray<R, D, const N: usize> {
    slots: [ReaderSlot<R>; N],
    delay: D,
    settle_ms: u32,
}

impl<R, D, const N: usize> ReaderArray<R, D, N>
where
    R: TagReader,
    D: DelayNs,
{
    /// Pair each reader with the slot at the same position in `table`.
    pub fn new(readers: [R; N], table: &[SlotConfig; N], delay: D) -> Self {
        let mut index = 0;
        let slots = readers.map(|reader| {
            let slot = ReaderSlot {
                index,
                config: table[index],
                last_read: 0,
                reader,
            };
            index += 1;
            slot
        });
        Self {
            slots,
            delay,
            settle_ms: SETTLE_DELAY_MS,
        }
    }

    pub fn with_settle_delay(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn settle_delay_ms(&self) -> u32 {
        self.settle_ms
    }

    pub fn slots(&self) -> &[ReaderSlot<R>; N] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<&ReaderSlot<R>, GadgetError> {
        self.slots
            .get(index)
            .ok_or(GadgetError::SlotOutOfRange { index, count: N })
    }

    pub fn slot_mut(&mut self, index: usize) -> Result<&mut ReaderSlot<R>, GadgetError> {
        self.slots
            .get_mut(index)
            .ok_or(GadgetError::SlotOutOfRange { index, count: N })
    }

    pub fn accepted_tags(&self) -> [u32; N] {
        self.slots.each_ref().map(|slot| slot.config.accepted_tag)
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Bring every reader up, in slot order.
    ///
    /// A reader counts as present once it answers a firmware query. With
    /// [`RetryPolicy::Forever`] a reader that never answers blocks here for
    /// good; with [`RetryPolicy::Attempts`] startup fails on that slot.
    pub fn initialize(&mut self, policy: RetryPolicy) -> Result<(), GadgetError> {
        for slot in self.slots.iter_mut() {
            if let Err(_err) = slot.reader.begin() {
                diag!(warn, "PN53x board #{} wake-up failed: {:?}", slot.index, _err);
            }

            let version = await_firmware(slot, policy)?;
            diag!(info, "Found chip PN5{:x}", version.ic());
            diag!(info, "Firmware ver. {}.{}", version.major(), version.minor());

            if let Err(_err) = slot.reader.sam_config() {
                diag!(warn, "SAM config failed on board #{}: {:?}", slot.index, _err);
            }
            if let Err(_err) = slot
                .reader
                .set_passive_activation_retries(PASSIVE_ACTIVATION_RETRIES)
            {
                diag!(warn, "Setting retries failed on board #{}: {:?}", slot.index, _err);
            }
        }
        diag!(info, "SUCCESS! System initialized. Waiting for RFID tags...");
        Ok(())
    }

    /// Poll one reader for an ISO14443A card and return its identifier.
    ///
    /// No card, a failed poll and a UID that is not 4 bytes long all read
    /// as 0. The settle delay runs after every poll.
    pub fn sample_slot(&mut self, index: usize) -> Result<u32, GadgetError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(GadgetError::SlotOutOfRange { index, count: N })?;
        diag!(debug, "READER #{}", index);

        let tag = match slot.reader.read_passive_target(CardFamily::Iso14443a) {
            Ok(Some(uid)) => {
                diag!(debug, "Found an ISO14443A card with {}-byte UID", uid.len());
                decode_uid(&uid)
            }
            Ok(None) => 0,
            Err(_err) => {
                diag!(debug, "Poll on reader #{} failed: {:?}", index, _err);
                0
            }
        };
        diag!(debug, "tag ID#{}", tag);
        slot.last_read = tag;

        self.delay.delay_ms(self.settle_ms);
        Ok(tag)
    }
}

fn await_firmware<R: TagReader>(
    slot: &mut ReaderSlot<R>,
    policy: RetryPolicy,
) -> Result<FirmwareVersion, GadgetError> {
    let mut failures = 0u32;
    loop {
        match slot.reader.firmware_version() {
            Ok(version) => return Ok(version),
            Err(_err) => {
                failures = failures.saturating_add(1);
                diag!(warn, "Didn't find PN53x board #{} ({:?})", slot.index, _err);
                if !policy.allows_retry(failures) {
                    return Err(GadgetError::ReaderUnresponsive {
                        slot: slot.index,
                        attempts: failures,
                    });
                }
            }
        }
    }
}
