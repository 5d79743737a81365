//! Board-agnostic motion core for the Stylus plotter controller
//!
//! This crate contains everything between a host line and a step pulse
//! that does not depend on a specific board:
//!
//! - Command parsing and validation
//! - The command queue between foreground and engine
//! - The step-generation engine and its shared handle
//! - Coordinate transforms (mixed axes, straight-line splitting, arcs)
//! - Error taxonomy and configuration types
//! - The step/direction output trait

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod motion;
pub mod queue;
pub mod state;
pub mod traits;
pub mod transform;

#[cfg(test)]
mod testing;
