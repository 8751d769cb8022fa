//! RFID Gadget Firmware
//! ESP32-S3 with eight PN532 readers on one SPI bus
//!
//! Polls every reader once per loop and compares what it sees with the
//! accepted tag of its slot. The lock output only moves when the unlock
//! trigger is armed in `rfid_gadget::config`.

use embedded_hal::spi::MODE_0;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, OutputPin, PinDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::{BitOrder, Config, DriverConfig};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
use esp_idf_hal::units::FromValueType;
use log::{info, warn};
use pn532::spi::SPIInterface;
use rfid_gadget::config::{READER_COUNT, SETTLE_DELAY_MS, SLOTS, STARTUP_RETRY, UNLOCK_TRIGGER};
use rfid_gadget::{Gadget, LockOutputs, Pn532Reader, ReaderArray, StepOutcome};

type Reader<'d> = Pn532Reader<SPIInterface<SpiDeviceDriver<'d, &'d SpiDriver<'d>>>, FreeRtos>;

// PN532 SPI tops out at 5 MHz; 1 MHz keeps long jumper wires happy
const SPI_BAUDRATE_MHZ: u32 = 1;

// Lock output pins (not in the shared config: they only exist on this board)
const PWM_OUT_PIN: i32 = 14;
const OPEN_LED_PIN: i32 = 15;
const CLOSED_LED_PIN: i32 = 16;
const PWM_FREQUENCY_KHZ: u32 = 1;

fn reader<'d>(
    bus: &'d SpiDriver<'d>,
    cs: AnyOutputPin,
    config: &Config,
) -> anyhow::Result<Reader<'d>> {
    let spi = SpiDeviceDriver::new(bus, Some(cs), config)?;
    Ok(Pn532Reader::new(SPIInterface { spi }, FreeRtos))
}

fn main() -> anyhow::Result<()> {
    // Required for ESP-IDF runtime patches
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Welcome to the Escape Room RFID Gadget v{}!", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // Shared bus: SCK gpio13, MISO gpio12, MOSI gpio11
    let bus = SpiDriver::new(
        peripherals.spi2,
        pins.gpio13,
        pins.gpio11,
        Some(pins.gpio12),
        &DriverConfig::new(),
    )?;
    let spi_config = Config::new()
        .baudrate(SPI_BAUDRATE_MHZ.MHz().into())
        .data_mode(MODE_0)
        .bit_order(BitOrder::LsbFirst);

    // Chip selects in slot order, matching SLOTS
    let readers: [Reader<'_>; READER_COUNT] = [
        reader(&bus, pins.gpio3.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio4.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio5.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio6.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio7.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio8.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio9.downgrade_output(), &spi_config)?,
        reader(&bus, pins.gpio10.downgrade_output(), &spi_config)?,
    ];
    for slot in SLOTS.iter() {
        info!("Slot CS gpio{} accepts tag {}", slot.chip_select, slot.accepted_tag);
    }

    info!(
        "Lock outputs: PWM gpio{}, open LED gpio{}, closed LED gpio{}",
        PWM_OUT_PIN, OPEN_LED_PIN, CLOSED_LED_PIN
    );
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(PWM_FREQUENCY_KHZ.kHz().into()),
    )?;
    let pwm = LedcDriver::new(peripherals.ledc.channel0, &timer, pins.gpio14)?;
    let open_led = PinDriver::output(pins.gpio15.downgrade_output())?;
    let closed_led = PinDriver::output(pins.gpio16.downgrade_output())?;
    let outputs = LockOutputs::new(pwm, open_led, closed_led);

    let readers = ReaderArray::new(readers, &SLOTS, FreeRtos);
    let mut gadget = Gadget::new(readers, outputs, UNLOCK_TRIGGER);
    gadget.start(STARTUP_RETRY)?;

    loop {
        match gadget.step() {
            // Nothing left to poll; keep the idle task and watchdog fed
            Ok(StepOutcome::Idle) => FreeRtos::delay_ms(SETTLE_DELAY_MS),
            Ok(StepOutcome::Polled(_)) | Ok(StepOutcome::Unlocked(_)) => {}
            Err(err) => {
                warn!("Loop step failed: {err}");
                FreeRtos::delay_ms(SETTLE_DELAY_MS);
            }
        }
    }
}
