//! Control lines (start, reset, data-ready) fixed at construction.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorType, InputPin, OutputPin};

use crate::error::{Error, LineError, Result};
use crate::wait::{Cancellation, poll_until};

/// Logical control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Conversion start.
    Start,
    /// Hardware reset.
    Reset,
    /// Data ready.
    Ready,
}

/// Electrical level at which a line is considered active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Active when high.
    ActiveHigh,
    /// Active when low.
    ActiveLow,
}

/// Placeholder for a line the deployment does not wire up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLine;

impl ErrorType for NoLine {
    type Error = Infallible;
}

impl OutputPin for NoLine {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoLine {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(false)
    }
}

/// Start, reset and data-ready handles with their polarities.
///
/// Defaults follow the ADS1248: START active high, RESET active low, DRDY active low.
#[derive(Debug)]
pub struct ControlLines<START = NoLine, RESET = NoLine, READY = NoLine> {
    start: Option<START>,
    reset: Option<RESET>,
    ready: Option<READY>,
    start_polarity: Polarity,
    reset_polarity: Polarity,
    ready_polarity: Polarity,
}

impl ControlLines {
    /// No lines wired up.
    pub const fn new() -> Self {
        Self {
            start: None,
            reset: None,
            ready: None,
            start_polarity: Polarity::ActiveHigh,
            reset_polarity: Polarity::ActiveLow,
            ready_polarity: Polarity::ActiveLow,
        }
    }
}

impl Default for ControlLines {
    fn default() -> Self {
        Self::new()
    }
}

impl<START, RESET, READY> ControlLines<START, RESET, READY> {
    /// Wires up the start line.
    pub fn with_start<P>(self, pin: P) -> ControlLines<P, RESET, READY> {
        ControlLines {
            start: Some(pin),
            reset: self.reset,
            ready: self.ready,
            start_polarity: self.start_polarity,
            reset_polarity: self.reset_polarity,
            ready_polarity: self.ready_polarity,
        }
    }

    /// Wires up the reset line.
    pub fn with_reset<P>(self, pin: P) -> ControlLines<START, P, READY> {
        ControlLines {
            start: self.start,
            reset: Some(pin),
            ready: self.ready,
            start_polarity: self.start_polarity,
            reset_polarity: self.reset_polarity,
            ready_polarity: self.ready_polarity,
        }
    }

    /// Wires up the data-ready line.
    pub fn with_ready<P>(self, pin: P) -> ControlLines<START, RESET, P> {
        ControlLines {
            start: self.start,
            reset: self.reset,
            ready: Some(pin),
            start_polarity: self.start_polarity,
            reset_polarity: self.reset_polarity,
            ready_polarity: self.ready_polarity,
        }
    }

    /// Overrides the polarity of one line.
    pub fn with_polarity(mut self, line: Line, polarity: Polarity) -> Self {
        match line {
            Line::Start => self.start_polarity = polarity,
            Line::Reset => self.reset_polarity = polarity,
            Line::Ready => self.ready_polarity = polarity,
        }
        self
    }

    /// Returns `true` if `line` is wired up.
    pub fn has(&self, line: Line) -> bool {
        match line {
            Line::Start => self.start.is_some(),
            Line::Reset => self.reset.is_some(),
            Line::Ready => self.ready.is_some(),
        }
    }

    /// Consumes the configuration and returns the pins.
    pub fn release(self) -> (Option<START>, Option<RESET>, Option<READY>) {
        (self.start, self.reset, self.ready)
    }
}

fn drive<P: OutputPin>(pin: &mut P, polarity: Polarity, active: bool) -> core::result::Result<(), LineError> {
    let high = active == (polarity == Polarity::ActiveHigh);
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|err| LineError::Pin(err.kind()))
}

impl<START, RESET, READY> ControlLines<START, RESET, READY>
where
    START: OutputPin,
    RESET: OutputPin,
    READY: InputPin,
{
    /// Drives an output line to its active or inactive level.
    pub fn set_level(&mut self, line: Line, active: bool) -> core::result::Result<(), LineError> {
        match line {
            Line::Start => {
                let pin = self.start.as_mut().ok_or(LineError::Missing(line))?;
                drive(pin, self.start_polarity, active)
            }
            Line::Reset => {
                let pin = self.reset.as_mut().ok_or(LineError::Missing(line))?;
                drive(pin, self.reset_polarity, active)
            }
            // Data-ready is an input.
            Line::Ready => Err(LineError::Missing(line)),
        }
    }

    /// Asserts an output line for `duration_us`, then deasserts it.
    pub fn pulse<D>(&mut self, line: Line, duration_us: u32, delay: &mut D) -> core::result::Result<(), LineError>
    where
        D: DelayNs + ?Sized,
    {
        self.set_level(line, true)?;
        delay.delay_us(duration_us);
        self.set_level(line, false)
    }

    /// Samples the data-ready line.
    pub fn is_ready(&mut self) -> core::result::Result<bool, LineError> {
        let pin = self.ready.as_mut().ok_or(LineError::Missing(Line::Ready))?;
        let level = match self.ready_polarity {
            Polarity::ActiveHigh => pin.is_high(),
            Polarity::ActiveLow => pin.is_low(),
        };
        level.map_err(|err| LineError::Pin(err.kind()))
    }

    /// Blocks until the data-ready line is active, bounded by `timeout_us`.
    pub fn wait_until_active<E, D, C>(&mut self, timeout_us: u32, delay: &mut D, cancel: &C) -> Result<(), E>
    where
        D: DelayNs + ?Sized,
        C: Cancellation + ?Sized,
    {
        if self.ready.is_none() {
            return Err(Error::Line(LineError::Missing(Line::Ready)));
        }
        poll_until(delay, timeout_us, cancel, || self.is_ready().map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::{NeverCancel, POLL_INTERVAL_US};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    struct NeverReady {
        polls: u32,
    }

    impl ErrorType for NeverReady {
        type Error = Infallible;
    }

    impl InputPin for NeverReady {
        fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
            self.polls += 1;
            Ok(true)
        }

        fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
            self.polls += 1;
            Ok(false)
        }
    }

    #[test]
    fn start_pulse_is_high_then_low() {
        let expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&expectations);
        let mut lines = ControlLines::new().with_start(start.clone());

        lines.pulse(Line::Start, 1_000, &mut NoopDelay::new()).unwrap();
        start.done();
    }

    #[test]
    fn reset_is_active_low() {
        let expectations = [PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)];
        let mut reset = PinMock::new(&expectations);
        let mut lines = ControlLines::new().with_reset(reset.clone());

        lines.pulse(Line::Reset, 1_000, &mut NoopDelay::new()).unwrap();
        reset.done();
    }

    #[test]
    fn missing_lines_are_reported() {
        let mut lines = ControlLines::new();
        assert_eq!(lines.set_level(Line::Start, true), Err(LineError::Missing(Line::Start)));
        assert_eq!(lines.is_ready(), Err(LineError::Missing(Line::Ready)));
        let result: Result<(), ()> = lines.wait_until_active(10_000, &mut NoopDelay::new(), &NeverCancel);
        assert_eq!(result, Err(Error::Line(LineError::Missing(Line::Ready))));
    }

    #[test]
    fn ten_millisecond_wait_on_a_silent_line_times_out() {
        let mut lines = ControlLines::new().with_ready(NeverReady { polls: 0 });
        let result: Result<(), ()> = lines.wait_until_active(10_000, &mut NoopDelay::new(), &NeverCancel);
        assert_eq!(result, Err(Error::Timeout));

        let (_, _, ready) = lines.release();
        assert_eq!(ready.map(|pin| pin.polls), Some(10_000 / POLL_INTERVAL_US + 1));
    }

    #[test]
    fn polarity_override_flips_the_sampled_level() {
        let mut lines = ControlLines::new()
            .with_ready(NeverReady { polls: 0 })
            .with_polarity(Line::Ready, Polarity::ActiveHigh);
        assert_eq!(lines.is_ready(), Ok(true));
    }
}
