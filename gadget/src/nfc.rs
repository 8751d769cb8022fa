//! PN532 readers, driven through the `pn532` crate.
//!
//! On the gadget every reader is a `pn532::spi::SPIInterface` over its own
//! `SpiDevice`: the bus (SCK, MISO, MOSI) is shared and the device owns the
//! chip-select line. The bus must run in mode 0, LSB first, at most 5 MHz.
//!
//! PN532 User Guide: https://www.nxp.com/docs/en/user-guide/141520.pdf

use core::convert::Infallible;
use core::fmt;

use embedded_hal::delay::DelayNs;
use pn532::requests::{Command, SAMMode};
use pn532::{CountDown, Interface, Request};
use thiserror::Error;

use crate::reader::{CardFamily, FirmwareVersion, TagReader, Uid};

/// Frame buffer, long enough for an InListPassiveTarget answer with a
/// 10-byte UID.
const BUF_LEN: usize = 64;

/// NbTg Tg SENS_RES(2) SEL_RES NFCIDLength NFCID1(up to 10)
const INLIST_RESPONSE_LEN: usize = 17;

/// RFConfiguration item 5: MxRtyATR, MxRtyPSL, MxRtyPassiveActivation.
const CFG_MAX_RETRIES: u8 = 0x05;

pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// The wake-up query in `begin` only needs to reach the chip.
const WAKEUP_TIMEOUT_MS: u32 = 50;

#[derive(Debug, Error)]
pub enum Pn532Error<E: fmt::Debug> {
    #[error("PN532 request failed: {0:?}")]
    Pn532(pn532::Error<E>),
    #[error("response payload too short ({0} bytes)")]
    ShortResponse(usize),
    #[error("card UID of {0} bytes does not fit")]
    UidTooLong(usize),
}

impl<E: fmt::Debug> From<pn532::Error<E>> for Pn532Error<E> {
    fn from(v: pn532::Error<E>) -> Self {
        Pn532Error::Pn532(v)
    }
}

/// Countdown in milliseconds, ticked by the ready-polling loop of the
/// `pn532` crate: every pending poll sleeps 1 ms.
#[derive(Debug)]
pub struct PollTimer<D> {
    delay: D,
    remaining_ms: u32,
}

impl<D: DelayNs> PollTimer<D> {
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            remaining_ms: 0,
        }
    }
}

impl<D: DelayNs> CountDown for PollTimer<D> {
    type Time = u32;

    fn start<T: Into<Self::Time>>(&mut self, count: T) {
        self.remaining_ms = count.into();
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        if self.remaining_ms == 0 {
            return Ok(());
        }
        self.delay.delay_ms(1);
        self.remaining_ms -= 1;
        Err(nb::Error::WouldBlock)
    }
}

/// One PN532 behind any `pn532::Interface`.
pub struct Pn532Reader<I, D> {
    chip: pn532::Pn532<I, PollTimer<D>, BUF_LEN>,
    timeout_ms: u32,
}

impl<I, D> Pn532Reader<I, D>
where
    I: Interface,
    D: DelayNs,
{
    pub fn new(interface: I, delay: D) -> Self {
        Self {
            chip: pn532::Pn532::new(interface, PollTimer::new(delay)),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// How long one request may take, ACK and response together.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn process<const M: usize>(
        &mut self,
        request: &Request<M>,
        response_len: usize,
    ) -> Result<&[u8], Pn532Error<I::Error>> {
        Ok(self.chip.process(request, response_len, self.timeout_ms)?)
    }
}

impl<I, D> TagReader for Pn532Reader<I, D>
where
    I: Interface,
    D: DelayNs,
{
    type Error = Pn532Error<I::Error>;

    fn begin(&mut self) -> Result<(), Self::Error> {
        // Selecting the chip wakes it; the first answer is often garbage
        if let Err(e) = self
            .chip
            .process(&Request::GET_FIRMWARE_VERSION, 4, WAKEUP_TIMEOUT_MS)
        {
            diag!(trace, "PN532 wake-up query: {:?}", e);
        }
        Ok(())
    }

    fn firmware_version(&mut self) -> Result<FirmwareVersion, Self::Error> {
        let payload = self.process(&Request::GET_FIRMWARE_VERSION, 4)?;
        match payload {
            [ic, ver, rev, support, ..] => Ok(FirmwareVersion(u32::from_be_bytes([
                *ic, *ver, *rev, *support,
            ]))),
            _ => Err(Pn532Error::ShortResponse(payload.len())),
        }
    }

    fn sam_config(&mut self) -> Result<(), Self::Error> {
        // No IRQ line on the gadget, readiness is polled over SPI
        self.process(&Request::sam_configuration(SAMMode::Normal, false), 0)?;
        Ok(())
    }

    fn set_passive_activation_retries(&mut self, retries: u8) -> Result<(), Self::Error> {
        let request = Request::new(
            Command::RFConfiguration,
            [CFG_MAX_RETRIES, 0xFF, 0x01, retries],
        );
        self.process(&request, 0)?;
        Ok(())
    }

    fn read_passive_target(&mut self, family: CardFamily) -> Result<Option<Uid>, Self::Error> {
        let request = Request::new(Command::InListPassiveTarget, [0x01, family.baud_code()]);
        let payload = self.process(&request, INLIST_RESPONSE_LEN)?;

        if payload.first() != Some(&1) {
            return Ok(None);
        }
        if payload.len() < 6 {
            return Err(Pn532Error::ShortResponse(payload.len()));
        }
        let uid_len = usize::from(payload[5]);
        let uid = payload
            .get(6..6 + uid_len)
            .ok_or(Pn532Error::ShortResponse(payload.len()))?;
        Uid::from_slice(uid)
            .map(Some)
            .map_err(|_| Pn532Error::UidTooLong(uid_len))
    }
}
