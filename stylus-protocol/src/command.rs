//! Command codes understood by the controller.

/// Two-letter (or one-letter) command mnemonic at the start of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandCode {
    /// Constant-rate move over a duration
    StepperMove,
    /// Mixed-axis move over a duration
    MixedAxisMove,
    /// Absolute move or home
    HomeMove,
    /// Jerk move, intervals mode
    LowLevelMove,
    /// Jerk move, timed mode
    LowLevelTimed,
    /// Snap move, intervals mode
    LowLevelThird,
    /// Snap move, timed mode
    TimedThird,
    /// Circular arc
    CircleMove,
    /// Emergency stop
    EmergencyStop,
    /// Clear step position
    ClearSteps,
    /// Query step position
    QuerySteps,
    /// Query motion status
    QueryMotors,
    /// Query utility values
    QueryUtility,
    /// Configure runtime settings
    Configure,
    /// Software reset
    Reset,
    /// Version
    Version,
}

impl CommandCode {
    /// Look up a command mnemonic, ignoring case
    pub fn parse(token: &str) -> Option<Self> {
        let bytes = token.trim().as_bytes();
        let upper = |i: usize| bytes.get(i).map(u8::to_ascii_uppercase);
        let code = match (bytes.len(), upper(0), upper(1)) {
            (1, Some(b'R'), None) => Self::Reset,
            (1, Some(b'V'), None) => Self::Version,
            (2, Some(a), Some(b)) => match (a, b) {
                (b'S', b'M') => Self::StepperMove,
                (b'X', b'M') => Self::MixedAxisMove,
                (b'H', b'M') => Self::HomeMove,
                (b'L', b'M') => Self::LowLevelMove,
                (b'L', b'T') => Self::LowLevelTimed,
                (b'L', b'3') => Self::LowLevelThird,
                (b'T', b'3') => Self::TimedThird,
                (b'C', b'M') => Self::CircleMove,
                (b'E', b'S') => Self::EmergencyStop,
                (b'C', b'S') => Self::ClearSteps,
                (b'Q', b'S') => Self::QuerySteps,
                (b'Q', b'M') => Self::QueryMotors,
                (b'Q', b'U') => Self::QueryUtility,
                (b'C', b'U') => Self::Configure,
                _ => return None,
            },
            _ => return None,
        };
        Some(code)
    }

    /// Canonical upper-case mnemonic, used for echo replies
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StepperMove => "SM",
            Self::MixedAxisMove => "XM",
            Self::HomeMove => "HM",
            Self::LowLevelMove => "LM",
            Self::LowLevelTimed => "LT",
            Self::LowLevelThird => "L3",
            Self::TimedThird => "T3",
            Self::CircleMove => "CM",
            Self::EmergencyStop => "ES",
            Self::ClearSteps => "CS",
            Self::QuerySteps => "QS",
            Self::QueryMotors => "QM",
            Self::QueryUtility => "QU",
            Self::Configure => "CU",
            Self::Reset => "R",
            Self::Version => "V",
        }
    }

    /// Split a line into its command code token and the field text
    pub fn split_line(line: &str) -> (&str, Option<&str>) {
        match line.split_once(',') {
            Some((code, rest)) => (code, Some(rest)),
            None => (line, None),
        }
    }
}
