//! Reply formatting.
//!
//! Replies are written into any [`core::fmt::Write`] sink, usually a
//! `heapless::String`, and always end with CR LF.

use core::fmt::{self, Write};

use crate::command::CommandCode;

/// How successful commands are acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReplyStyle {
    /// Send an acknowledgement at all
    pub acknowledge: bool,
    /// Acknowledge with the command mnemonic instead of `OK`
    pub echo: bool,
}

impl Default for ReplyStyle {
    fn default() -> Self {
        Self {
            acknowledge: true,
            echo: false,
        }
    }
}

/// Write a success reply, with an optional data line before it
pub fn write_success<W: Write>(
    out: &mut W,
    style: ReplyStyle,
    code: CommandCode,
    data: Option<&str>,
) -> fmt::Result {
    if let Some(data) = data {
        write!(out, "{}\r\n", data)?;
    }
    if style.acknowledge {
        let ack = if style.echo { code.as_str() } else { "OK" };
        write!(out, "{}\r\n", ack)?;
    }
    Ok(())
}

/// Write an error line: `!<code> Err: <text>[ (param <n>)]`
pub fn write_error<W: Write>(out: &mut W, code: u8, text: &str, param: u8) -> fmt::Result {
    write!(out, "!{} Err: {}", code, text)?;
    if param != 0 {
        write!(out, " (param {})", param)?;
    }
    out.write_str("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    #[test]
    fn test_plain_ok() {
        let mut s = String::<32>::new();
        write_success(&mut s, ReplyStyle::default(), CommandCode::StepperMove, None).unwrap();
        assert_eq!(s.as_str(), "OK\r\n");
    }

    #[test]
    fn test_echo_and_data() {
        let mut s = String::<32>::new();
        let style = ReplyStyle {
            acknowledge: true,
            echo: true,
        };
        write_success(&mut s, style, CommandCode::QuerySteps, Some("10,-4")).unwrap();
        assert_eq!(s.as_str(), "10,-4\r\nQS\r\n");
    }

    #[test]
    fn test_silent_still_sends_data() {
        let mut s = String::<32>::new();
        let style = ReplyStyle {
            acknowledge: false,
            echo: false,
        };
        write_success(&mut s, style, CommandCode::StepperMove, None).unwrap();
        assert!(s.is_empty());
        write_success(&mut s, style, CommandCode::QuerySteps, Some("0,0")).unwrap();
        assert_eq!(s.as_str(), "0,0\r\n");
    }

    #[test]
    fn test_error_line() {
        let mut s = String::<48>::new();
        write_error(&mut s, 3, "Missing parameter", 3).unwrap();
        assert_eq!(s.as_str(), "!3 Err: Missing parameter (param 3)\r\n");

        s.clear();
        write_error(&mut s, 1, "Unknown command", 0).unwrap();
        assert_eq!(s.as_str(), "!1 Err: Unknown command\r\n");
    }
}
