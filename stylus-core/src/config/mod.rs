//! Configuration types
//!
//! Board-agnostic configuration structures and the TOML subset used to
//! override them.

pub mod toml;
pub mod types;

pub use toml::parse_config;
pub use types::*;
