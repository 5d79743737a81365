//! Coordinate transforms
//!
//! Pure functions and iterators from logical move descriptions to the
//! physical `(axis1, axis2)` step deltas the engine consumes.

pub mod arc;
pub mod line;
pub mod mixed;

pub use arc::{arc_segments, ArcPath};
pub use line::StraightLine;
pub use mixed::mixed_to_axes;
