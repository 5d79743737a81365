//! Step/direction GPIO output
//!
//! Drives an external step/direction driver (A4988, DRV8825, TMC in
//! standalone mode) straight from two GPIO pins per axis. A step pulse is
//! raised by [`StepOutput::step`] and lowered at the start of the next
//! engine tick, so the pulse width is one tick period.
//!
//! Pins must be infallible, which is the case for on-chip GPIO.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use stylus_core::traits::{Axis, Direction, StepOutput};

/// Step and direction pins of one axis
pub struct AxisPins<S, D> {
    step: S,
    dir: D,
    /// If true, forward = dir pin LOW
    invert_dir: bool,
    /// Step pin currently high
    pulsing: bool,
}

impl<S, D> AxisPins<S, D>
where
    S: OutputPin<Error = Infallible>,
    D: OutputPin<Error = Infallible>,
{
    /// Create an axis with both pins driven low
    pub fn new(step: S, dir: D, invert_dir: bool) -> Self {
        let mut pins = Self {
            step,
            dir,
            invert_dir,
            pulsing: false,
        };
        pins.step.set_low().unwrap_or_else(|e| match e {});
        pins.set_direction(Direction::Forward);
        pins
    }

    fn set_direction(&mut self, direction: Direction) {
        let high = (direction == Direction::Forward) != self.invert_dir;
        if high {
            self.dir.set_high().unwrap_or_else(|e| match e {});
        } else {
            self.dir.set_low().unwrap_or_else(|e| match e {});
        }
    }

    fn raise(&mut self) {
        self.step.set_high().unwrap_or_else(|e| match e {});
        self.pulsing = true;
    }

    fn lower(&mut self) {
        if self.pulsing {
            self.step.set_low().unwrap_or_else(|e| match e {});
            self.pulsing = false;
        }
    }
}

/// Both plotter axes as a [`StepOutput`]
pub struct StepDirOutput<S1, D1, S2, D2> {
    first: AxisPins<S1, D1>,
    second: AxisPins<S2, D2>,
}

impl<S1, D1, S2, D2> StepDirOutput<S1, D1, S2, D2>
where
    S1: OutputPin<Error = Infallible>,
    D1: OutputPin<Error = Infallible>,
    S2: OutputPin<Error = Infallible>,
    D2: OutputPin<Error = Infallible>,
{
    pub fn new(first: AxisPins<S1, D1>, second: AxisPins<S2, D2>) -> Self {
        Self { first, second }
    }
}

impl<S1, D1, S2, D2> StepOutput for StepDirOutput<S1, D1, S2, D2>
where
    S1: OutputPin<Error = Infallible>,
    D1: OutputPin<Error = Infallible>,
    S2: OutputPin<Error = Infallible>,
    D2: OutputPin<Error = Infallible>,
{
    fn begin_tick(&mut self) {
        self.first.lower();
        self.second.lower();
    }

    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        match axis {
            Axis::First => self.first.set_direction(direction),
            Axis::Second => self.second.set_direction(direction),
        }
    }

    fn step(&mut self, axis: Axis) {
        match axis {
            Axis::First => self.first.raise(),
            Axis::Second => self.second.raise(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embedded_hal::digital::ErrorType;

    /// Mock GPIO pin counting rising edges
    struct MockPin<'a> {
        high: &'a Cell<bool>,
        rises: &'a Cell<u32>,
    }

    impl ErrorType for MockPin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for MockPin<'_> {
        fn set_high(&mut self) -> Result<(), Infallible> {
            if !self.high.get() {
                self.rises.set(self.rises.get() + 1);
            }
            self.high.set(true);
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high.set(false);
            Ok(())
        }
    }

    struct Probe {
        high: Cell<bool>,
        rises: Cell<u32>,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                high: Cell::new(true),
                rises: Cell::new(0),
            }
        }

        fn pin(&self) -> MockPin<'_> {
            MockPin {
                high: &self.high,
                rises: &self.rises,
            }
        }
    }

    #[test]
    fn test_pins_start_low_and_forward() {
        let step = Probe::new();
        let dir = Probe::new();
        let _axis = AxisPins::new(step.pin(), dir.pin(), false);
        assert!(!step.high.get());
        assert!(dir.high.get());
    }

    #[test]
    fn test_inverted_direction() {
        let step = Probe::new();
        let dir = Probe::new();
        let mut axis = AxisPins::new(step.pin(), dir.pin(), true);
        assert!(!dir.high.get());
        axis.set_direction(Direction::Reverse);
        assert!(dir.high.get());
    }

    #[test]
    fn test_pulse_lasts_one_tick() {
        let (s1, d1, s2, d2) = (Probe::new(), Probe::new(), Probe::new(), Probe::new());
        let mut out = StepDirOutput::new(
            AxisPins::new(s1.pin(), d1.pin(), false),
            AxisPins::new(s2.pin(), d2.pin(), false),
        );

        out.begin_tick();
        out.set_direction(Axis::Second, Direction::Reverse);
        out.step(Axis::Second);
        assert!(s2.high.get());
        assert!(!s1.high.get());
        assert!(!d2.high.get());

        out.begin_tick();
        assert!(!s2.high.get());

        // Back-to-back ticks still give one rising edge each
        out.step(Axis::Second);
        out.begin_tick();
        out.step(Axis::Second);
        assert_eq!(s2.rises.get(), 3);
    }
}
