//! Hardware driver implementations
//!
//! Concrete implementations of the output traits defined in stylus-core:
//!
//! - Step/direction GPIO output for external stepper drivers

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
