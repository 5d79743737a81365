//! Line assembly from a raw serial byte stream.
//!
//! Bytes are fed one at a time. A line ends at CR or LF; a CR LF pair
//! therefore yields one line followed by an ignored empty line.

use heapless::String;

/// Longest command line accepted, excluding the terminator
pub const MAX_LINE_LEN: usize = 128;

/// Errors reported when a line ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// More than [`MAX_LINE_LEN`] bytes arrived before the terminator
    Overflow,
    /// A byte outside printable ASCII arrived
    InvalidByte,
}

/// A complete command line
pub type Line = String<MAX_LINE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblyState {
    /// Collecting bytes
    Collecting,
    /// Line is already broken, skip until the terminator
    Discarding(LineError),
}

/// Byte-fed line assembler
#[derive(Debug, Clone)]
pub struct LineAssembler {
    state: AssemblyState,
    buffer: Line,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create an empty assembler
    pub const fn new() -> Self {
        Self {
            state: AssemblyState::Collecting,
            buffer: String::new(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.state = AssemblyState::Collecting;
        self.buffer.clear();
    }

    /// Number of bytes buffered for the current line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a non-empty line,
    /// `Ok(None)` when more bytes are needed, or `Err` once for a line that
    /// could not be buffered.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if byte == b'\r' || byte == b'\n' {
            let state = self.state;
            let line = core::mem::take(&mut self.buffer);
            self.state = AssemblyState::Collecting;
            return match state {
                AssemblyState::Discarding(err) => Err(err),
                AssemblyState::Collecting if line.is_empty() => Ok(None),
                AssemblyState::Collecting => Ok(Some(line)),
            };
        }

        if let AssemblyState::Discarding(_) = self.state {
            return Ok(None);
        }

        if !(byte == b'\t' || (0x20..0x7F).contains(&byte)) {
            self.buffer.clear();
            self.state = AssemblyState::Discarding(LineError::InvalidByte);
            return Ok(None);
        }

        if self.buffer.push(byte as char).is_err() {
            self.buffer.clear();
            self.state = AssemblyState::Discarding(LineError::Overflow);
        }
        Ok(None)
    }

    /// Feed bytes until the first complete line
    ///
    /// Returns the line and the number of bytes consumed. Bytes after the
    /// line are left for the next call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Result<Option<Line>, LineError>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (other, i + 1),
            }
        }
        (Ok(None), bytes.len())
    }
}
