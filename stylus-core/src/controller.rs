//! Foreground command processor
//!
//! Takes one assembled host line at a time, validates it, and either
//! queues motion for the engine or answers from an engine snapshot. The
//! controller owns the producer side of the queue and the runtime
//! settings; it reaches the engine only through an [`EngineLink`].
//!
//! Lines are processed strictly one after another. A queued move replies as
//! soon as it is in the queue; `HM` first waits for the engine to go idle,
//! since its delta depends on the final position of everything before it.

use core::fmt::Write;

use heapless::spsc::Producer;
use heapless::String;
use stylus_protocol::{write_error, write_success, CommandCode, LineError, ReplyStyle};

use crate::command::{
    parse_line, AbsoluteMove, MotionCommand, ParsedLine, Request, Setting, UtilityQuery,
};
use crate::config::{MotionConfig, MotionLimits};
use crate::engine::EngineLink;
use crate::error::{CommandError, ErrorKind, ErrorState};
use crate::queue::CommandQueue;
use crate::transform::{arc_segments, StraightLine};

/// Longest reply: a data line plus the acknowledgement
pub const REPLY_LEN: usize = 96;

/// Text sent back for one line
pub type Reply = String<REPLY_LEN>;

type DataLine = String<64>;

pub struct Controller<'q, const N: usize> {
    queue: CommandQueue<'q, N>,
    config: MotionConfig,
    limits: MotionLimits,
    style: ReplyStyle,
    checksum: bool,
    errors: ErrorState,
}

impl<'q, const N: usize> Controller<'q, N> {
    /// Create a controller with settings from `config`
    ///
    /// The configured queue depth is capped to what the ring can hold.
    pub fn new(
        producer: Producer<'q, MotionCommand, N>,
        config: MotionConfig,
    ) -> Result<Self, ErrorKind> {
        let queue = CommandQueue::new(producer, configured_depth::<N>(&config))?;
        Ok(Self {
            queue,
            limits: config.motion,
            style: reply_style(&config),
            checksum: config.protocol.checksum,
            errors: ErrorState::new(),
            config,
        })
    }

    pub fn queue(&self) -> &CommandQueue<'q, N> {
        &self.queue
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn style(&self) -> ReplyStyle {
        self.style
    }

    pub fn checksum_required(&self) -> bool {
        self.checksum
    }

    /// Process one complete line and build its reply
    pub fn handle_line<L: EngineLink + ?Sized>(&mut self, line: &str, link: &mut L) -> Reply {
        self.harvest_faults(link);

        let mut reply = Reply::new();
        // REPLY_LEN covers the longest data line, so writes cannot fail
        match self.process(line, link) {
            Ok((code, data)) => {
                let _ = write_success(&mut reply, self.style, code, data.as_deref());
            }
            Err(err) => {
                self.errors.record(err.kind);
                let _ = write_error(&mut reply, err.kind.code(), err.kind.text(), err.param);
            }
        }
        reply
    }

    /// Reply for a line the assembler had to drop
    pub fn handle_line_error(&mut self, err: LineError) -> Reply {
        let err = CommandError::from(err);
        self.errors.record(err.kind);
        let mut reply = Reply::new();
        let _ = write_error(&mut reply, err.kind.code(), err.kind.text(), err.param);
        reply
    }

    /// Move engine faults into the error state
    pub fn harvest_faults<L: EngineLink + ?Sized>(&mut self, link: &mut L) {
        if let Some(fault) = link.take_fault() {
            self.errors.record(fault.into());
        }
    }

    fn process<L: EngineLink + ?Sized>(
        &mut self,
        line: &str,
        link: &mut L,
    ) -> Result<(CommandCode, Option<DataLine>), CommandError> {
        let ParsedLine { code, request } = parse_line(line, &self.limits, self.checksum)?;
        let mut data = DataLine::new();

        match request {
            Request::Enqueue(command) => {
                self.queue.enqueue_blocking(command, || link.wait());
            }
            Request::Absolute(target) => self.move_absolute(&target, link),
            Request::Arc(arc) => {
                for segment in arc_segments(&arc, &self.limits) {
                    self.queue
                        .enqueue_blocking(MotionCommand::Segment(segment), || link.wait());
                }
            }
            Request::EmergencyStop { clear_accumulators } => {
                let report = link.abort(clear_accumulators);
                let _ = write!(
                    data,
                    "{},{},{},{}",
                    u8::from(report.interrupted),
                    report.remaining[0],
                    report.remaining[1],
                    report.discarded
                );
            }
            Request::ClearSteps => link.clear_position(),
            Request::QuerySteps => {
                let [first, second] = link.snapshot().position;
                let _ = write!(data, "{},{}", first, second);
            }
            Request::QueryMotors => {
                let snap = link.snapshot();
                let _ = write!(
                    data,
                    "QM,{},{},{},{}",
                    u8::from(snap.is_executing()),
                    u8::from(snap.axes_moving[0]),
                    u8::from(snap.axes_moving[1]),
                    u8::from(snap.queued > 0)
                );
            }
            Request::QueryUtility(query) => {
                let _ = match query {
                    UtilityQuery::MaxDepth => write!(data, "{}", CommandQueue::<N>::MAX_DEPTH),
                    UtilityQuery::Depth => write!(data, "{}", self.queue.depth()),
                    UtilityQuery::Queued => write!(data, "{}", self.queue.len()),
                    UtilityQuery::Errors => write!(
                        data,
                        "{},{}",
                        self.errors.last_code(),
                        self.errors.mask()
                    ),
                };
            }
            Request::Configure(setting) => self.configure(setting)?,
            Request::Reset => self.reset(link),
            Request::Version => {
                let _ = write!(data, "Stylus motion core v{}", env!("CARGO_PKG_VERSION"));
            }
        }

        let data = if data.is_empty() { None } else { Some(data) };
        Ok((code, data))
    }

    /// Queue a straight move from the settled position to `target`
    fn move_absolute<L: EngineLink + ?Sized>(&mut self, target: &AbsoluteMove, link: &mut L) {
        while !link.snapshot().is_idle() {
            link.wait();
        }
        let position = link.snapshot().position;
        let goal = target.target_or_origin();
        let delta = [
            i64::from(goal[0]) - i64::from(position[0]),
            i64::from(goal[1]) - i64::from(position[1]),
        ];

        for steps in split_delta(delta) {
            let line = StraightLine::new(
                steps,
                target.frequency_hz,
                self.limits.min_secondary_rate_centihz,
            );
            for segment in line {
                self.queue
                    .enqueue_blocking(MotionCommand::Segment(segment), || link.wait());
            }
        }
    }

    fn configure(&mut self, setting: Setting) -> Result<(), CommandError> {
        match setting {
            Setting::Acknowledge(on) => self.style.acknowledge = on,
            Setting::Echo(on) => self.style.echo = on,
            Setting::Checksum(on) => self.checksum = on,
            Setting::QueueDepth(depth) => self
                .queue
                .set_depth(usize::from(depth))
                .map_err(|kind| CommandError::at(kind, 2))?,
        }
        Ok(())
    }

    /// Stop everything and return to the configured defaults
    fn reset<L: EngineLink + ?Sized>(&mut self, link: &mut L) {
        link.reset();
        self.limits = self.config.motion;
        self.style = reply_style(&self.config);
        self.checksum = self.config.protocol.checksum;
        // The queue is empty after the engine reset
        let _ = self.queue.set_depth(configured_depth::<N>(&self.config));
        self.errors.clear();
    }
}

/// Cut a delta into equal straight parts that each fit `i32`
///
/// Two counters can be up to `2^32 - 1` apart, which takes at most three
/// parts.
fn split_delta(delta: [i64; 2]) -> impl Iterator<Item = [i32; 2]> {
    let longest = delta[0].unsigned_abs().max(delta[1].unsigned_abs());
    let parts = longest.div_ceil(i32::MAX as u64).max(1) as i64;
    (0..parts).map(move |part| {
        // Each share is at most ceil(|d| / parts), which fits
        let share = |d: i64| (d * (part + 1) / parts - d * part / parts) as i32;
        [share(delta[0]), share(delta[1])]
    })
}

fn configured_depth<const N: usize>(config: &MotionConfig) -> usize {
    usize::from(config.queue.depth)
        .min(N.saturating_sub(1))
        .max(1)
}

fn reply_style(config: &MotionConfig) -> ReplyStyle {
    ReplyStyle {
        acknowledge: config.protocol.ok_replies,
        echo: config.protocol.echo_replies,
    }
}
