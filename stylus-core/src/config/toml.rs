//! Simple TOML parser for controller configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! Stylus configuration. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (integer, boolean)
//! - `[motion]`, `[queue]` and `[protocol]` section headers
//! - Comments (# ...), including after a value
//! - Underscores in integers (`25_000`)
//!
//! NOT supported:
//! - Strings, arrays, tables of any other kind
//! - Dotted keys

use super::types::{ConfigError, MotionConfig};

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Motion,
    Queue,
    Protocol,
}

/// Parse TOML text over the defaults and validate the result
pub fn parse_config(input: &str) -> Result<MotionConfig, ConfigError> {
    let mut config = MotionConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header.strip_suffix(']').ok_or(ConfigError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "motion" => Ok(Section::Motion),
        "queue" => Ok(Section::Queue),
        "protocol" => Ok(Section::Protocol),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ConfigError> {
    let mut result: u64 = 0;
    let mut digits = 0;
    for b in value.bytes() {
        match b {
            b'_' => continue,
            b'0'..=b'9' => {
                result = result
                    .checked_mul(10)
                    .and_then(|r| r.checked_add(u64::from(b - b'0')))
                    .ok_or(ConfigError::OutOfRange)?;
                digits += 1;
            }
            _ => return Err(ConfigError::InvalidValue),
        }
    }
    if digits == 0 {
        return Err(ConfigError::InvalidValue);
    }
    T::try_from(result).map_err(|_| ConfigError::OutOfRange)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut MotionConfig,
) -> Result<(), ConfigError> {
    match section {
        Section::Motion => {
            let motion = &mut config.motion;
            match key {
                "tick_hz" => motion.tick_hz = parse_int(value)?,
                "min_frequency_hz" => motion.min_frequency_hz = parse_int(value)?,
                "max_frequency_hz" => motion.max_frequency_hz = parse_int(value)?,
                "min_secondary_rate_centihz" => {
                    motion.min_secondary_rate_centihz = parse_int(value)?
                }
                "arc_segment_steps" => motion.arc_segment_steps = parse_int(value)?,
                _ => return Err(ConfigError::UnknownKey),
            }
        }
        Section::Queue => match key {
            "depth" => config.queue.depth = parse_int(value)?,
            _ => return Err(ConfigError::UnknownKey),
        },
        Section::Protocol => {
            let protocol = &mut config.protocol;
            match key {
                "checksum" => protocol.checksum = parse_bool(value)?,
                "ok_replies" => protocol.ok_replies = parse_bool(value)?,
                "echo_replies" => protocol.echo_replies = parse_bool(value)?,
                _ => return Err(ConfigError::UnknownKey),
            }
        }
        Section::Root => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_gives_defaults() {
        assert_eq!(parse_config(""), Ok(MotionConfig::default()));
        assert_eq!(
            parse_config("# only a comment\n\n"),
            Ok(MotionConfig::default())
        );
    }

    #[test]
    fn test_parse_full_config() {
        let text = r#"
# Reference plotter
[motion]
tick_hz = 25_000
min_frequency_hz = 2
max_frequency_hz = 20000   # driver limit
min_secondary_rate_centihz = 131
arc_segment_steps = 12

[queue]
depth = 16

[protocol]
checksum = true
ok_replies = true
echo_replies = false
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.motion.max_frequency_hz, 20_000);
        assert_eq!(config.motion.arc_segment_steps, 12);
        assert_eq!(config.queue.depth, 16);
        assert!(config.protocol.checksum);
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("motion"), Ok(Section::Motion));
        assert_eq!(parse_section_header(" queue "), Ok(Section::Queue));
        assert_eq!(
            parse_section_header("stepper.x"),
            Err(ConfigError::InvalidSection)
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert_eq!(
            parse_config("[queue]\nsize = 4\n"),
            Err(ConfigError::UnknownKey)
        );
        assert_eq!(parse_config("depth = 4\n"), Err(ConfigError::UnknownKey));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            parse_config("[protocol]\nchecksum = yes\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[queue]\ndepth = -1\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[queue]\ndepth = 70000\n"),
            Err(ConfigError::OutOfRange)
        );
        assert_eq!(parse_config("[motion\n"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_result_is_validated() {
        assert_eq!(
            parse_config("[motion]\nmax_frequency_hz = 40000\n"),
            Err(ConfigError::OutOfRange)
        );
    }
}
