//! Step/direction output trait
//!
//! The engine only ever asks for two things per axis: a direction level
//! and a step pulse. Everything electrical (pulse width, polarity, driver
//! enable) belongs to the implementation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the two physical motor axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Motor 1
    First,
    /// Motor 2
    Second,
}

impl Axis {
    /// Both axes in index order
    pub const BOTH: [Axis; 2] = [Axis::First, Axis::Second];

    /// Index into per-axis arrays
    pub const fn index(self) -> usize {
        match self {
            Axis::First => 0,
            Axis::Second => 1,
        }
    }
}

/// Direction of travel along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Position counter increases
    #[default]
    Forward,
    /// Position counter decreases
    Reverse,
}

impl Direction {
    /// Direction that moves a signed step count toward its sign
    pub fn of(steps: i64) -> Self {
        if steps < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Position delta of one step
    pub const fn delta(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Physical step/direction output driven by the engine
///
/// All methods are called from the engine tick and must not block.
pub trait StepOutput {
    /// Called once at the start of every tick, before any other call
    ///
    /// Implementations that raise the step line in [`step`](Self::step)
    /// lower it here, giving pulses one tick wide.
    fn begin_tick(&mut self) {}

    /// Set the direction level of an axis
    ///
    /// Called when a command is loaded and whenever a signed rate changes
    /// sign. Always precedes the first step in the new direction.
    fn set_direction(&mut self, axis: Axis, direction: Direction);

    /// Emit one step pulse
    fn step(&mut self, axis: Axis);
}
