//! Configuration type definitions
//!
//! These types describe the motion controller's configuration. Defaults
//! match the reference hardware; a board can override them from its
//! embedded TOML file.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Engine tick rate of the reference hardware (40 µs period)
pub const DEFAULT_TICK_HZ: u32 = 25_000;

/// Lowest accepted step frequency for frequency-driven moves
pub const MIN_FREQUENCY_HZ: u32 = 2;

/// Highest accepted step frequency for frequency-driven moves
pub const MAX_FREQUENCY_HZ: u32 = 25_000;

/// Slowest reliable secondary-axis rate, in hundredths of a hertz
pub const MIN_SECONDARY_RATE_CENTIHZ: u32 = 131;

/// Unit moves per arc chord
pub const DEFAULT_ARC_SEGMENT_STEPS: u16 = 8;

/// Queue depth at power-on
pub const DEFAULT_QUEUE_DEPTH: u16 = 32;

/// Motion validation limits and engine timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionLimits {
    /// Engine tick rate
    pub tick_hz: u32,
    /// Inclusive frequency range of `HM` and `CM`
    pub min_frequency_hz: u32,
    pub max_frequency_hz: u32,
    /// Below this, straight lines are split into a staircase
    pub min_secondary_rate_centihz: u32,
    /// Unit moves grouped into one arc chord
    pub arc_segment_steps: u16,
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            min_frequency_hz: MIN_FREQUENCY_HZ,
            max_frequency_hz: MAX_FREQUENCY_HZ,
            min_secondary_rate_centihz: MIN_SECONDARY_RATE_CENTIHZ,
            arc_segment_steps: DEFAULT_ARC_SEGMENT_STEPS,
        }
    }
}

/// Command queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueueConfig {
    /// Logical depth, at most the queue's storage capacity
    pub depth: u16,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

/// Host protocol defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProtocolConfig {
    /// Require a trailing checksum on every line
    pub checksum: bool,
    /// Acknowledge successful commands
    pub ok_replies: bool,
    /// Acknowledge with the command mnemonic instead of `OK`
    pub echo_replies: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            checksum: false,
            ok_replies: true,
            echo_replies: false,
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    pub motion: MotionLimits,
    pub queue: QueueConfig,
    pub protocol: ProtocolConfig,
}

/// Why a configuration was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type
    InvalidValue,
    /// Value outside what the controller supports
    OutOfRange,
}

impl MotionConfig {
    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        if m.tick_hz < 1_000 {
            return Err(ConfigError::OutOfRange);
        }
        if m.min_frequency_hz == 0
            || m.min_frequency_hz > m.max_frequency_hz
            || m.max_frequency_hz > m.tick_hz
        {
            return Err(ConfigError::OutOfRange);
        }
        if m.min_secondary_rate_centihz == 0 || m.arc_segment_steps == 0 {
            return Err(ConfigError::OutOfRange);
        }
        if self.queue.depth == 0 {
            return Err(ConfigError::OutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.motion.tick_hz, 25_000);
        assert_eq!(config.motion.min_frequency_hz, 2);
        assert_eq!(config.motion.max_frequency_hz, 25_000);
        assert!(config.protocol.ok_replies);
    }

    #[test]
    fn test_frequency_above_tick_rate_rejected() {
        let mut config = MotionConfig::default();
        config.motion.max_frequency_hz = 30_000;
        assert_eq!(config.validate(), Err(ConfigError::OutOfRange));
    }

    #[test]
    fn test_inverted_frequency_range_rejected() {
        let mut config = MotionConfig::default();
        config.motion.min_frequency_hz = 500;
        config.motion.max_frequency_hz = 100;
        assert_eq!(config.validate(), Err(ConfigError::OutOfRange));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let mut config = MotionConfig::default();
        config.queue.depth = 0;
        assert_eq!(config.validate(), Err(ConfigError::OutOfRange));
    }
}
