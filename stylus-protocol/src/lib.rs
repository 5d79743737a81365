//! Stylus host protocol
//!
//! The host talks to the controller over a serial link using short ASCII
//! command lines:
//! ```text
//! SM,100,250,-40\r
//! ^^ ^^^^^^^^^^^ ^
//! |  fields      terminator (CR or LF)
//! command code
//! ```
//!
//! Every line is answered with `OK` (or a terse echo of the command code),
//! optionally preceded by a data line for queries, or with a single error
//! line of the form `!<code> Err: <text>`.
//!
//! This crate only knows about framing, fields and formatting. What a
//! command means is decided by `stylus-core`.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod checksum;
pub mod command;
pub mod fields;
pub mod line;
pub mod reply;

pub use checksum::{checksum_of, strip_checksum};
pub use command::CommandCode;
pub use fields::{FieldError, FieldErrorKind, FieldValue, Fields};
pub use line::{LineAssembler, LineError, MAX_LINE_LEN};
pub use reply::{write_error, write_success, ReplyStyle};
