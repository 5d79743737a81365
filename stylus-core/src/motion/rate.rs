//! Fixed-point step rates and accumulators
//!
//! A rate is an unsigned Q1.31 fraction of a step per engine tick:
//! [`ONE_STEP`] means one step every tick, which is the fastest an axis
//! can go. An [`Accumulator`] adds the rate every tick and emits a step
//! each time it reaches [`ONE_STEP`], keeping the remainder as carry.
//!
//! Integer only: the targets have no FPU.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fractional bits of a rate
pub const RATE_FRAC_BITS: u32 = 31;

/// One full step, as a rate or accumulator value
pub const ONE_STEP: u32 = 1 << RATE_FRAC_BITS;

/// Why a rate could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RateFault {
    /// More than one step per tick
    TooFast,
    /// Rounds down to no motion at all
    TooSlow,
}

/// Convert a duration in milliseconds to engine ticks
#[inline]
pub fn ticks_for_ms(duration_ms: u32, tick_hz: u32) -> u64 {
    u64::from(duration_ms) * u64::from(tick_hz) / 1000
}

/// Rate that covers `steps` in exactly `ticks` ticks
///
/// Rounded up, so an accumulator starting anywhere at or above zero has
/// emitted all `steps` by the last tick.
pub fn rate_for_duration(steps: u32, ticks: u64) -> Result<u32, RateFault> {
    if steps == 0 {
        return Ok(0);
    }
    if ticks == 0 {
        return Err(RateFault::TooFast);
    }
    let scaled = u64::from(steps) << RATE_FRAC_BITS;
    if scaled / ticks == 0 {
        return Err(RateFault::TooSlow);
    }
    let rate = scaled.div_ceil(ticks);
    if rate > u64::from(ONE_STEP) {
        return Err(RateFault::TooFast);
    }
    Ok(rate as u32)
}

/// Rate of an axis stepping at `frequency_hz`
pub fn rate_for_frequency(frequency_hz: u32, tick_hz: u32) -> Result<u32, RateFault> {
    if tick_hz == 0 || frequency_hz > tick_hz {
        return Err(RateFault::TooFast);
    }
    let rate = (u64::from(frequency_hz) << RATE_FRAC_BITS) / u64::from(tick_hz);
    if rate == 0 {
        return Err(RateFault::TooSlow);
    }
    Ok(rate as u32)
}

/// Rate for the secondary axis of a straight line
///
/// Scales the primary rate by `secondary / primary`, rounded up so the
/// secondary axis never finishes after the primary one.
pub fn rate_matched(primary_rate: u32, primary: u32, secondary: u32) -> u32 {
    if primary == 0 || secondary == 0 {
        return 0;
    }
    let scaled = u64::from(primary_rate) * u64::from(secondary);
    scaled.div_ceil(u64::from(primary)).min(u64::from(ONE_STEP)) as u32
}

/// Step accumulator with carry
///
/// Invariant: the stored value is always below [`ONE_STEP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Accumulator(u32);

impl Accumulator {
    /// Empty accumulator
    pub const ZERO: Self = Self(0);

    /// Carried fraction of a step
    #[inline]
    pub const fn carry(self) -> u32 {
        self.0
    }

    /// Drop the carried fraction
    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Add one tick worth of `rate`, returning true when a step is due
    ///
    /// `rate` must not exceed [`ONE_STEP`]; callers check it at load.
    #[inline]
    pub fn advance(&mut self, rate: u32) -> bool {
        debug_assert!(rate <= ONE_STEP);
        let sum = self.0 + rate.min(ONE_STEP);
        if sum >= ONE_STEP {
            self.0 = sum - ONE_STEP;
            true
        } else {
            self.0 = sum;
            false
        }
    }
}
