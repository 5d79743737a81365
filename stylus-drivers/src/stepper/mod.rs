//! Stepper driver implementations

pub mod pins;

pub use pins::{AxisPins, StepDirOutput};
