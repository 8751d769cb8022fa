//! Lock output: a PWM channel driving the lock plus open/closed LEDs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use crate::config::{PWM_FULL_SCALE, PWM_LOCKED_LEVEL, PWM_UNLOCKED_LEVEL};
use crate::error::GadgetError;

/// Whatever shows the lock state to the players.
pub trait LockIndicator {
    fn show_locked(&mut self) -> Result<(), GadgetError>;

    /// Switch both LEDs on or off together, for the countdown.
    fn blink(&mut self, on: bool) -> Result<(), GadgetError>;

    fn show_unlocked(&mut self) -> Result<(), GadgetError>;
}

pub struct LockOutputs<P, L> {
    pwm: P,
    open_led: L,
    closed_led: L,
}

impl<P, L> LockOutputs<P, L>
where
    P: SetDutyCycle,
    L: OutputPin,
{
    pub fn new(pwm: P, open_led: L, closed_led: L) -> Self {
        Self {
            pwm,
            open_led,
            closed_led,
        }
    }

    pub fn release(self) -> (P, L, L) {
        (self.pwm, self.open_led, self.closed_led)
    }

    fn drive(&mut self, level: u16, open: PinState) -> Result<(), GadgetError> {
        self.pwm
            .set_duty_cycle_fraction(level, PWM_FULL_SCALE)
            .map_err(|_| GadgetError::OutputFault)?;
        self.open_led
            .set_state(open)
            .map_err(|_| GadgetError::OutputFault)?;
        self.closed_led
            .set_state(!open)
            .map_err(|_| GadgetError::OutputFault)
    }
}

impl<P, L> LockIndicator for LockOutputs<P, L>
where
    P: SetDutyCycle,
    L: OutputPin,
{
    fn show_locked(&mut self) -> Result<(), GadgetError> {
        self.drive(PWM_LOCKED_LEVEL, PinState::Low)
    }

    fn blink(&mut self, on: bool) -> Result<(), GadgetError> {
        let state = PinState::from(on);
        self.open_led
            .set_state(state)
            .map_err(|_| GadgetError::OutputFault)?;
        self.closed_led
            .set_state(state)
            .map_err(|_| GadgetError::OutputFault)
    }

    fn show_unlocked(&mut self) -> Result<(), GadgetError> {
        self.drive(PWM_UNLOCKED_LEVEL, PinState::High)
    }
}

/// Count `ticks` down to zero, blinking once per tick, then unlock.
pub fn count_down_and_unlock<O, D>(
    outputs: &mut O,
    delay: &mut D,
    ticks: u8,
    tick_ms: u32,
) -> Result<(), GadgetError>
where
    O: LockIndicator,
    D: DelayNs,
{
    diag!(info, "Device unlocking in...");
    for _remaining in (0..ticks).rev() {
        outputs.blink(true)?;
        delay.delay_ms(tick_ms);
        outputs.blink(false)?;
        diag!(info, "{}", _remaining);
    }
    outputs.show_unlocked()
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use embedded_hal::digital::{self, ErrorKind};
    use embedded_hal::pwm;

    use super::*;
    use crate::sim::{InstantDelay, SimOutputs};

    #[derive(Default)]
    struct FakePwm {
        duty: u16,
    }

    impl pwm::ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        high: bool,
        toggles: u32,
    }

    impl digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.toggles += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.toggles += 1;
            Ok(())
        }
    }

    struct BrokenPin;

    impl digital::ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }
    }

    fn outputs() -> LockOutputs<FakePwm, FakePin> {
        LockOutputs::new(FakePwm::default(), FakePin::default(), FakePin::default())
    }

    #[test]
    fn locked_state() {
        let mut out = outputs();
        out.show_locked().unwrap();
        let (pwm, open, closed) = out.release();
        assert_eq!(pwm.duty, 0);
        assert!(!open.high);
        assert!(closed.high);
    }

    #[test]
    fn unlocked_state() {
        let mut out = outputs();
        out.show_unlocked().unwrap();
        let (pwm, open, closed) = out.release();
        assert_eq!(pwm.duty, 1000);
        assert!(open.high);
        assert!(!closed.high);
    }

    #[test]
    fn countdown_blinks_each_tick_then_unlocks() {
        let mut out = outputs();
        out.show_locked().unwrap();
        count_down_and_unlock(&mut out, &mut InstantDelay, 4, 1000).unwrap();
        let (pwm, open, closed) = out.release();
        assert_eq!(pwm.duty, 1000);
        assert!(open.high);
        assert!(!closed.high);
        // show_locked + 4 ticks of on/off + show_unlocked
        assert_eq!(open.toggles, 1 + 8 + 1);
    }

    #[test]
    fn countdown_with_sim_outputs() {
        let mut out = SimOutputs::default();
        count_down_and_unlock(&mut out, &mut InstantDelay, 4, 10).unwrap();
        assert_eq!(out.blinks, 4);
        assert!(out.unlocked);
    }

    #[test]
    fn pin_failure_is_reported() {
        let mut out = LockOutputs::new(FakePwm::default(), BrokenPin, BrokenPin);
        assert_eq!(out.show_locked(), Err(GadgetError::OutputFault));
        assert_eq!(
            count_down_and_unlock(&mut out, &mut InstantDelay, 4, 10),
            Err(GadgetError::OutputFault)
        );
    }
}
