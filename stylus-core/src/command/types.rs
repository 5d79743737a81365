//! Validated command types
//!
//! A [`Request`] is one parsed and validated host line. The motion part of
//! it that reaches the engine is a [`MotionCommand`]; absolute and arc
//! moves are resolved by the foreground into [`LineSegment`]s first.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::ClearFlags;

/// Queue entry consumed by the engine
///
/// Immutable once enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotionCommand {
    /// Hold for a number of ticks without moving
    Delay { ticks: u64 },
    /// Signed steps per axis over a wall-time duration
    ConstantRate(ConstantRate),
    /// Logical `(a, b)` offsets converted to `(a+b, a-b)` at load
    MixedAxis(MixedAxisMove),
    /// Frequency-driven straight line, ends when both step counts are met
    Segment(LineSegment),
    /// Rate, acceleration and jerk integrated every tick
    Jerk(JerkMove),
    /// Jerk move with an added snap term
    Snap(SnapMove),
}

impl MotionCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            MotionCommand::Delay { .. } => CommandKind::Delay,
            MotionCommand::ConstantRate(_) => CommandKind::ConstantRate,
            MotionCommand::MixedAxis(_) => CommandKind::MixedAxis,
            MotionCommand::Segment(_) => CommandKind::Segment,
            MotionCommand::Jerk(_) => CommandKind::Jerk,
            MotionCommand::Snap(_) => CommandKind::Snap,
        }
    }
}

/// Tag of a [`MotionCommand`], for status and fault reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommandKind {
    Delay,
    ConstantRate,
    MixedAxis,
    Segment,
    Jerk,
    Snap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstantRate {
    /// Wall time in milliseconds, at least 1
    pub duration_ms: u32,
    pub steps: [i32; 2],
    pub clear: ClearFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixedAxisMove {
    pub duration_ms: u32,
    pub a: i32,
    pub b: i32,
    pub clear: ClearFlags,
}

/// Straight line with the longer axis stepping at `frequency_hz`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSegment {
    pub frequency_hz: u32,
    pub steps: [i32; 2],
}

impl LineSegment {
    /// Step count of the axis that drives the timing
    pub fn primary_steps(&self) -> u32 {
        self.steps[0]
            .unsigned_abs()
            .max(self.steps[1].unsigned_abs())
    }

    pub fn is_empty(&self) -> bool {
        self.steps == [0, 0]
    }
}

/// When a jerk or snap move ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    /// After this many engine ticks; the residual carry is dropped at the end
    Intervals(u32),
    /// After this many milliseconds; the residual carry stays for the next command
    Timed { duration_ms: u32 },
}

/// Per-axis terms of a jerk move, in rate units per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JerkAxis {
    /// Signed Q1.31 steps per tick; the sign is the direction
    pub rate: i32,
    pub accel: i32,
    pub jerk: i32,
}

/// Per-axis terms of a snap move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnapAxis {
    pub rate: i32,
    pub accel: i32,
    pub jerk: i32,
    pub snap: i32,
}

impl From<JerkAxis> for SnapAxis {
    fn from(axis: JerkAxis) -> Self {
        Self {
            rate: axis.rate,
            accel: axis.accel,
            jerk: axis.jerk,
            snap: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JerkMove {
    pub termination: Termination,
    pub axes: [JerkAxis; 2],
    pub clear: ClearFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnapMove {
    pub termination: Termination,
    pub axes: [SnapAxis; 2],
    pub clear: ClearFlags,
}

/// Move to an absolute position, or to the origin without one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbsoluteMove {
    pub frequency_hz: u32,
    pub target: Option<[i32; 2]>,
}

impl AbsoluteMove {
    pub fn target_or_origin(&self) -> [i32; 2] {
        self.target.unwrap_or([0, 0])
    }
}

/// Arc winding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Arc from the current position around `center` to `destination`
///
/// Both points are relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArcMove {
    pub frequency_hz: u32,
    pub destination: [i16; 2],
    pub center: [i16; 2],
    pub winding: Winding,
}

/// Runtime setting changed by `CU`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
    /// Send an acknowledgement for successful commands
    Acknowledge(bool),
    /// Logical queue depth
    QueueDepth(u16),
    /// Acknowledge with the command mnemonic
    Echo(bool),
    /// Require a trailing checksum on every line
    Checksum(bool),
}

/// Value requested by `QU`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UtilityQuery {
    /// Largest queue depth the build supports
    MaxDepth,
    /// Configured queue depth
    Depth,
    /// Commands currently queued
    Queued,
    /// Last error code and sticky mask
    Errors,
}

/// One validated host line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Goes straight to the queue
    Enqueue(MotionCommand),
    /// Waits for idle, then becomes line segments
    Absolute(AbsoluteMove),
    /// Becomes line segments
    Arc(ArcMove),
    EmergencyStop { clear_accumulators: bool },
    ClearSteps,
    QuerySteps,
    QueryMotors,
    QueryUtility(UtilityQuery),
    Configure(Setting),
    Reset,
    Version,
}
