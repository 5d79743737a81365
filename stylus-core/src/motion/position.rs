//! Position state owned by the engine
//!
//! Per-axis signed step counters plus the accumulator carry that persists
//! from one command to the next unless a clear flag drops it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::rate::Accumulator;
use crate::traits::{Axis, Direction};

/// Step counters and accumulators of both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionState {
    steps: [i32; 2],
    accumulators: [Accumulator; 2],
}

impl PositionState {
    /// Origin with empty accumulators
    pub const fn new() -> Self {
        Self {
            steps: [0; 2],
            accumulators: [Accumulator::ZERO; 2],
        }
    }

    /// Absolute step counters
    pub fn steps(&self) -> [i32; 2] {
        self.steps
    }

    /// Step counter of one axis
    pub fn axis(&self, axis: Axis) -> i32 {
        self.steps[axis.index()]
    }

    /// Carried accumulator fractions
    pub fn carry(&self) -> [u32; 2] {
        [self.accumulators[0].carry(), self.accumulators[1].carry()]
    }

    pub(crate) fn accumulators_mut(&mut self) -> &mut [Accumulator; 2] {
        &mut self.accumulators
    }

    /// Record one emitted step
    ///
    /// Counters wrap at the `i32` range, like the hardware counters they
    /// replace.
    pub(crate) fn record_step(&mut self, axis: Axis, direction: Direction) {
        let counter = &mut self.steps[axis.index()];
        *counter = counter.wrapping_add(direction.delta());
    }

    /// Drop the carry of the axes selected by `clear`
    pub(crate) fn clear_accumulators(&mut self, clear: ClearFlags) {
        for axis in Axis::BOTH {
            if clear.includes(axis) {
                self.accumulators[axis.index()].clear();
            }
        }
    }

    /// Zero counters and accumulators
    pub(crate) fn zero(&mut self) {
        *self = Self::new();
    }
}

/// Which axes start a command with an empty accumulator
///
/// Wire values: 0 none, 1 first axis, 2 second axis, 3 both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClearFlags(u8);

impl ClearFlags {
    pub const NONE: Self = Self(0);
    pub const BOTH: Self = Self(3);

    /// Decode a wire value, `None` outside `0..=3`
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits <= 3 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the given axis is cleared
    pub const fn includes(self, axis: Axis) -> bool {
        self.0 & (1 << axis.index()) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_step_wraps() {
        let mut pos = PositionState::new();
        pos.record_step(Axis::First, Direction::Reverse);
        assert_eq!(pos.steps(), [-1, 0]);

        pos.steps[1] = i32::MAX;
        pos.record_step(Axis::Second, Direction::Forward);
        assert_eq!(pos.axis(Axis::Second), i32::MIN);
    }

    #[test]
    fn test_clear_flags_decode() {
        assert_eq!(ClearFlags::from_bits(4), None);
        let first = ClearFlags::from_bits(1).unwrap();
        assert!(first.includes(Axis::First));
        assert!(!first.includes(Axis::Second));
        assert!(ClearFlags::BOTH.includes(Axis::Second));
        assert!(ClearFlags::NONE.is_empty());
    }

    #[test]
    fn test_clear_selected_accumulators() {
        let mut pos = PositionState::new();
        for acc in pos.accumulators_mut() {
            acc.advance(100);
        }
        pos.clear_accumulators(ClearFlags::from_bits(2).unwrap());
        assert_eq!(pos.carry(), [100, 0]);
        pos.zero();
        assert_eq!(pos, PositionState::new());
    }
}
