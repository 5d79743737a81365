//! Host commands: validated types and the line parser

pub mod parser;
pub mod types;

pub use parser::{parse_line, ParsedLine};
pub use types::*;
