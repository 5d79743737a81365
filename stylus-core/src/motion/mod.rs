//! Motion numerics
//!
//! Fixed-point rates, step accumulators and the per-axis position state
//! the engine integrates into.

pub mod position;
pub mod rate;

pub use position::{ClearFlags, PositionState};
pub use rate::{
    rate_for_duration, rate_for_frequency, rate_matched, ticks_for_ms, Accumulator,
    RateFault, ONE_STEP,
};
