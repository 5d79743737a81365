//! Per-command integrators
//!
//! A [`MotionCommand`] is turned into an [`ActiveMove`] once, when the
//! engine loads it. Everything that can fail is computed at that point;
//! after that each tick is a handful of integer adds. The only runtime
//! failure is a jerk or snap profile that accelerates past one step per
//! tick.

use crate::command::{
    CommandKind, ConstantRate, JerkMove, LineSegment, MotionCommand, SnapAxis, SnapMove,
    Termination,
};
use crate::motion::{
    rate_for_duration, rate_for_frequency, rate_matched, ticks_for_ms, ClearFlags, PositionState,
    RateFault, ONE_STEP,
};
use crate::traits::{Axis, Direction, StepOutput};
use crate::transform::mixed_to_axes;

/// What one tick of a move did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Progress {
    pub stepped: [bool; 2],
    pub finished: bool,
}

/// A loaded command being integrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActiveMove {
    kind: CommandKind,
    motion: Motion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Hold { ticks_left: u64 },
    Linear(Linear),
    Profiled(Profiled),
}

/// Fixed rates with per-axis step budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Linear {
    rates: [u32; 2],
    directions: [Direction; 2],
    remaining: [u32; 2],
    /// Duration-terminated when set, otherwise ends with the last step
    ticks_left: Option<u64>,
}

/// One axis of a jerk or snap profile, widened for integration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProfileAxis {
    rate: i64,
    accel: i64,
    jerk: i64,
    snap: i64,
    direction: Direction,
}

impl ProfileAxis {
    fn new(terms: SnapAxis) -> Self {
        Self {
            rate: i64::from(terms.rate),
            accel: i64::from(terms.accel),
            jerk: i64::from(terms.jerk),
            snap: i64::from(terms.snap),
            direction: Direction::of(i64::from(terms.rate)),
        }
    }

    fn is_moving(&self) -> bool {
        self.rate != 0 || self.accel != 0 || self.jerk != 0 || self.snap != 0
    }

    /// Integrate the derivative chain one tick, returning the step rate
    fn integrate(&mut self) -> Result<u32, RateFault> {
        self.jerk = self.jerk.saturating_add(self.snap);
        self.accel = self.accel.saturating_add(self.jerk);
        self.rate = self.rate.saturating_add(self.accel);
        let magnitude = self.rate.unsigned_abs();
        if magnitude > u64::from(ONE_STEP) {
            return Err(RateFault::TooFast);
        }
        Ok(magnitude as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Profiled {
    axes: [ProfileAxis; 2],
    ticks_left: u64,
    /// Intervals mode drops the residual carry when the move ends
    discard_carry: bool,
}

impl ActiveMove {
    /// Prepare `command` for integration
    ///
    /// Applies its clear flags and sets the direction outputs.
    pub fn load(
        command: &MotionCommand,
        tick_hz: u32,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Result<Self, RateFault> {
        let motion = match *command {
            MotionCommand::Delay { ticks } => Motion::Hold { ticks_left: ticks },
            MotionCommand::ConstantRate(cmd) => {
                Motion::Linear(Linear::timed(&cmd, tick_hz, position, out)?)
            }
            MotionCommand::MixedAxis(cmd) => {
                let steps = mixed_to_axes(cmd.a, cmd.b).ok_or(RateFault::TooFast)?;
                let cmd = ConstantRate {
                    duration_ms: cmd.duration_ms,
                    steps,
                    clear: cmd.clear,
                };
                Motion::Linear(Linear::timed(&cmd, tick_hz, position, out)?)
            }
            MotionCommand::Segment(seg) => Motion::Linear(Linear::segment(&seg, tick_hz, out)?),
            MotionCommand::Jerk(cmd) => {
                Motion::Profiled(Profiled::from_jerk(&cmd, tick_hz, position, out))
            }
            MotionCommand::Snap(cmd) => {
                Motion::Profiled(Profiled::from_snap(&cmd, tick_hz, position, out))
            }
        };
        Ok(Self {
            kind: command.kind(),
            motion,
        })
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Steps each axis still owes, zero for moves without a step budget
    pub fn remaining(&self) -> [u32; 2] {
        match &self.motion {
            Motion::Linear(linear) => linear.remaining,
            _ => [0, 0],
        }
    }

    /// Whether each axis still has motion ahead of it
    pub fn axes_moving(&self) -> [bool; 2] {
        match &self.motion {
            Motion::Hold { .. } => [false, false],
            Motion::Linear(linear) => [linear.remaining[0] > 0, linear.remaining[1] > 0],
            Motion::Profiled(p) => [p.axes[0].is_moving(), p.axes[1].is_moving()],
        }
    }

    /// Integrate one tick
    pub fn tick(
        &mut self,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Result<Progress, RateFault> {
        match &mut self.motion {
            Motion::Hold { ticks_left } => {
                *ticks_left = ticks_left.saturating_sub(1);
                Ok(Progress {
                    stepped: [false; 2],
                    finished: *ticks_left == 0,
                })
            }
            Motion::Linear(linear) => Ok(linear.tick(position, out)),
            Motion::Profiled(profiled) => profiled.tick(position, out),
        }
    }
}

/// Advance one axis accumulator and emit a step when it overflows
fn advance_axis(
    axis: Axis,
    rate: u32,
    direction: Direction,
    position: &mut PositionState,
    out: &mut impl StepOutput,
) -> bool {
    if !position.accumulators_mut()[axis.index()].advance(rate) {
        return false;
    }
    out.step(axis);
    position.record_step(axis, direction);
    true
}

impl Linear {
    /// Duration-terminated move
    fn timed(
        cmd: &ConstantRate,
        tick_hz: u32,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Result<Self, RateFault> {
        let ticks = ticks_for_ms(cmd.duration_ms, tick_hz);
        let remaining = [cmd.steps[0].unsigned_abs(), cmd.steps[1].unsigned_abs()];
        let rates = [
            rate_for_duration(remaining[0], ticks)?,
            rate_for_duration(remaining[1], ticks)?,
        ];
        position.clear_accumulators(cmd.clear);
        let directions = set_directions(cmd.steps, out);
        Ok(Self {
            rates,
            directions,
            remaining,
            ticks_left: Some(ticks),
        })
    }

    /// Step-count-terminated line with the longer axis at the segment frequency
    fn segment(
        seg: &LineSegment,
        tick_hz: u32,
        out: &mut impl StepOutput,
    ) -> Result<Self, RateFault> {
        let remaining = [seg.steps[0].unsigned_abs(), seg.steps[1].unsigned_abs()];
        let primary = seg.primary_steps();
        let primary_rate = rate_for_frequency(seg.frequency_hz, tick_hz)?;
        let rates = [
            rate_matched(primary_rate, primary, remaining[0]),
            rate_matched(primary_rate, primary, remaining[1]),
        ];
        let directions = set_directions(seg.steps, out);
        Ok(Self {
            rates,
            directions,
            remaining,
            ticks_left: None,
        })
    }

    fn tick(&mut self, position: &mut PositionState, out: &mut impl StepOutput) -> Progress {
        let mut progress = Progress::default();

        if let Some(ticks_left) = &mut self.ticks_left {
            if *ticks_left == 0 {
                progress.finished = true;
                return progress;
            }
            *ticks_left -= 1;
        } else if self.remaining == [0, 0] {
            progress.finished = true;
            return progress;
        }

        for axis in Axis::BOTH {
            let i = axis.index();
            if self.remaining[i] == 0 {
                continue;
            }
            if advance_axis(axis, self.rates[i], self.directions[i], position, out) {
                self.remaining[i] -= 1;
                progress.stepped[i] = true;
            }
        }

        progress.finished = match self.ticks_left {
            Some(ticks_left) => ticks_left == 0,
            None => self.remaining == [0, 0],
        };
        progress
    }
}

/// Drive the direction outputs of the axes that will move
fn set_directions(steps: [i32; 2], out: &mut impl StepOutput) -> [Direction; 2] {
    let mut directions = [Direction::Forward; 2];
    for axis in Axis::BOTH {
        let i = axis.index();
        directions[i] = Direction::of(i64::from(steps[i]));
        if steps[i] != 0 {
            out.set_direction(axis, directions[i]);
        }
    }
    directions
}

impl Profiled {
    fn from_jerk(
        cmd: &JerkMove,
        tick_hz: u32,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Self {
        let axes = [SnapAxis::from(cmd.axes[0]), SnapAxis::from(cmd.axes[1])];
        Self::new(cmd.termination, axes, cmd.clear, tick_hz, position, out)
    }

    fn from_snap(
        cmd: &SnapMove,
        tick_hz: u32,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Self {
        Self::new(cmd.termination, cmd.axes, cmd.clear, tick_hz, position, out)
    }

    fn new(
        termination: Termination,
        terms: [SnapAxis; 2],
        clear: ClearFlags,
        tick_hz: u32,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Self {
        let (ticks_left, discard_carry) = match termination {
            Termination::Intervals(intervals) => (u64::from(intervals), true),
            Termination::Timed { duration_ms } => (ticks_for_ms(duration_ms, tick_hz), false),
        };
        position.clear_accumulators(clear);

        let axes = [ProfileAxis::new(terms[0]), ProfileAxis::new(terms[1])];
        for axis in Axis::BOTH {
            let profile = &axes[axis.index()];
            if profile.is_moving() {
                out.set_direction(axis, profile.direction);
            }
        }
        Self {
            axes,
            ticks_left,
            discard_carry,
        }
    }

    fn tick(
        &mut self,
        position: &mut PositionState,
        out: &mut impl StepOutput,
    ) -> Result<Progress, RateFault> {
        let mut progress = Progress::default();
        if self.ticks_left == 0 {
            progress.finished = true;
            return Ok(progress);
        }
        self.ticks_left -= 1;

        for axis in Axis::BOTH {
            let profile = &mut self.axes[axis.index()];
            let rate = profile.integrate()?;
            if profile.rate != 0 {
                let direction = Direction::of(profile.rate);
                if direction != profile.direction {
                    profile.direction = direction;
                    out.set_direction(axis, direction);
                }
            }
            let direction = profile.direction;
            progress.stepped[axis.index()] = advance_axis(axis, rate, direction, position, out);
        }

        if self.ticks_left == 0 {
            progress.finished = true;
            if self.discard_carry {
                position.clear_accumulators(ClearFlags::BOTH);
            }
        }
        Ok(progress)
    }
}
