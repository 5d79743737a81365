//! Error taxonomy reported to the host
//!
//! Every failure, whether found while validating a line or by the engine
//! after a command left the queue, maps to exactly one [`ErrorKind`]. Codes
//! and texts are stable so host tooling can match them literally.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use stylus_protocol::{FieldError, FieldErrorKind, LineError};

use crate::command::CommandKind;
use crate::motion::RateFault;

/// Host-visible error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorKind {
    /// Command code not recognised
    UnknownCommand,
    /// A field violates its declared range
    ParameterOutsideLimit,
    /// A required field, or half of a required pair, is absent
    MissingParameter,
    /// Content after the last expected field
    ExtraCharacters,
    /// Checksum mode is on and the checksum is absent or wrong
    ChecksumMismatch,
    /// A rate computed after conversion is too fast or rounds to zero
    RateComputationFailure,
    /// Queue full (only with a non-blocking enqueue)
    QueueFull,
}

impl ErrorKind {
    /// All kinds in code order
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::UnknownCommand,
        ErrorKind::ParameterOutsideLimit,
        ErrorKind::MissingParameter,
        ErrorKind::ExtraCharacters,
        ErrorKind::ChecksumMismatch,
        ErrorKind::RateComputationFailure,
        ErrorKind::QueueFull,
    ];

    /// Stable numeric code
    pub const fn code(self) -> u8 {
        match self {
            ErrorKind::UnknownCommand => 1,
            ErrorKind::ParameterOutsideLimit => 2,
            ErrorKind::MissingParameter => 3,
            ErrorKind::ExtraCharacters => 4,
            ErrorKind::ChecksumMismatch => 5,
            ErrorKind::RateComputationFailure => 6,
            ErrorKind::QueueFull => 7,
        }
    }

    /// Stable human-readable text
    pub const fn text(self) -> &'static str {
        match self {
            ErrorKind::UnknownCommand => "Unknown command",
            ErrorKind::ParameterOutsideLimit => "Parameter outside limit",
            ErrorKind::MissingParameter => "Missing parameter",
            ErrorKind::ExtraCharacters => "Extra parameter",
            ErrorKind::ChecksumMismatch => "Checksum incorrect",
            ErrorKind::RateComputationFailure => "Step rate out of range",
            ErrorKind::QueueFull => "FIFO full",
        }
    }

    /// Bit of this kind in the sticky mask
    pub const fn mask_bit(self) -> u16 {
        1 << self.code()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A rejected line: the error kind plus the offending field, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandError {
    pub kind: ErrorKind,
    /// 1-based field index, 0 when not tied to a field
    pub param: u8,
}

impl CommandError {
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind, param: 0 }
    }

    pub const fn at(kind: ErrorKind, param: u8) -> Self {
        Self { kind, param }
    }
}

impl From<ErrorKind> for CommandError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<FieldError> for CommandError {
    fn from(err: FieldError) -> Self {
        let kind = match err.kind {
            FieldErrorKind::Missing => ErrorKind::MissingParameter,
            FieldErrorKind::OutOfRange | FieldErrorKind::Malformed => {
                ErrorKind::ParameterOutsideLimit
            }
            FieldErrorKind::Extra => ErrorKind::ExtraCharacters,
            FieldErrorKind::Checksum => ErrorKind::ChecksumMismatch,
        };
        Self::at(kind, err.index)
    }
}

impl From<LineError> for CommandError {
    fn from(_: LineError) -> Self {
        // Anything the assembler could not buffer is unparsed trailing content.
        Self::new(ErrorKind::ExtraCharacters)
    }
}

/// A command the engine had to abort after dequeuing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineFault {
    pub fault: RateFault,
    pub command: CommandKind,
}

impl From<EngineFault> for ErrorKind {
    fn from(_: EngineFault) -> Self {
        ErrorKind::RateComputationFailure
    }
}

/// Last error plus sticky categories
///
/// Each failure overwrites the last error and sets its bit in the mask.
/// Only a reset clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorState {
    last: Option<ErrorKind>,
    mask: u16,
}

impl ErrorState {
    pub const fn new() -> Self {
        Self {
            last: None,
            mask: 0,
        }
    }

    /// Record a failure
    pub fn record(&mut self, kind: ErrorKind) {
        self.last = Some(kind);
        self.mask |= kind.mask_bit();
    }

    /// Most recent failure
    pub fn last(&self) -> Option<ErrorKind> {
        self.last
    }

    /// Code of the most recent failure, 0 if none
    pub fn last_code(&self) -> u8 {
        self.last.map_or(0, ErrorKind::code)
    }

    /// Every category seen since the last reset
    pub fn mask(&self) -> u16 {
        self.mask
    }

    /// Whether a category has been seen since the last reset
    pub fn has_seen(&self, kind: ErrorKind) -> bool {
        self.mask & kind.mask_bit() != 0
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
