//! Step-generation engine
//!
//! [`Engine::tick`] is called once per engine period from the highest
//! priority context. Each call:
//!
//! 1. ends the previous step pulses,
//! 2. retires the command that finished on the last tick,
//! 3. loads the next queued command if none is in flight,
//! 4. integrates one tick of the active command.
//!
//! The engine owns the queue consumer, position and accumulators. Other
//! contexts reach it only through [`SharedEngine`].

mod profile;
pub mod shared;

pub use shared::{EngineLink, SharedEngine, SharedLink};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use self::profile::ActiveMove;
use crate::command::{CommandKind, MotionCommand};
use crate::error::EngineFault;
use crate::motion::{ClearFlags, PositionState};
use crate::queue::CommandConsumer;
use crate::state::{EngineEvent, EnginePhase};
use crate::traits::StepOutput;

/// Result of one engine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutcome {
    /// Axes that emitted a step
    pub stepped: [bool; 2],
    /// A command reached its target on this tick
    pub completed: bool,
    /// A command was aborted on this tick
    pub fault: Option<EngineFault>,
}

/// What an emergency stop interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbortReport {
    /// A command was in flight
    pub interrupted: bool,
    /// Steps the interrupted command still owed per axis
    pub remaining: [u32; 2],
    /// Queued commands thrown away
    pub discarded: usize,
}

/// Consistent view of the engine, taken in one critical section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineSnapshot {
    pub position: [i32; 2],
    pub carry: [u32; 2],
    pub phase: EnginePhase,
    /// Commands waiting in the queue
    pub queued: usize,
    /// Kind of the command in flight
    pub active: Option<CommandKind>,
    pub axes_moving: [bool; 2],
}

impl EngineSnapshot {
    /// Nothing in flight and nothing queued
    pub fn is_idle(&self) -> bool {
        self.phase == EnginePhase::Idle && self.queued == 0
    }

    /// Something in flight or queued
    pub fn is_executing(&self) -> bool {
        self.phase != EnginePhase::Idle || self.queued > 0
    }
}

pub struct Engine<'q, const N: usize> {
    queue: CommandConsumer<'q, N>,
    tick_hz: u32,
    phase: EnginePhase,
    active: Option<ActiveMove>,
    position: PositionState,
    fault: Option<EngineFault>,
}

impl<'q, const N: usize> Engine<'q, N> {
    pub fn new(queue: CommandConsumer<'q, N>, tick_hz: u32) -> Self {
        Self {
            queue,
            tick_hz,
            phase: EnginePhase::Idle,
            active: None,
            position: PositionState::new(),
            fault: None,
        }
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    fn apply(&mut self, event: EngineEvent) {
        self.phase = self.phase.transition(event);
    }

    /// Run one engine period
    pub fn tick(&mut self, out: &mut impl StepOutput) -> TickOutcome {
        out.begin_tick();
        let mut outcome = TickOutcome::default();

        if self.phase == EnginePhase::Completing {
            self.apply(EngineEvent::Retired);
        }

        if self.active.is_none() {
            let Some(command) = self.queue.dequeue() else {
                return outcome;
            };
            match self.load(&command, out) {
                Ok(active) => {
                    self.active = Some(active);
                    self.apply(EngineEvent::CommandLoaded);
                }
                Err(fault) => {
                    outcome.fault = Some(fault);
                    return outcome;
                }
            }
        }

        let Some(active) = self.active.as_mut() else {
            return outcome;
        };
        match active.tick(&mut self.position, out) {
            Ok(progress) => {
                outcome.stepped = progress.stepped;
                if progress.finished {
                    self.active = None;
                    self.apply(EngineEvent::TargetReached);
                    outcome.completed = true;
                } else {
                    self.apply(EngineEvent::TickIntegrated);
                }
            }
            Err(fault) => {
                let fault = EngineFault {
                    fault,
                    command: active.kind(),
                };
                self.active = None;
                self.record_fault(fault);
                outcome.fault = Some(fault);
            }
        }
        outcome
    }

    fn load(
        &mut self,
        command: &MotionCommand,
        out: &mut impl StepOutput,
    ) -> Result<ActiveMove, EngineFault> {
        ActiveMove::load(command, self.tick_hz, &mut self.position, out).map_err(|fault| {
            let fault = EngineFault {
                fault,
                command: command.kind(),
            };
            self.record_fault(fault);
            fault
        })
    }

    fn record_fault(&mut self, fault: EngineFault) {
        self.fault = Some(fault);
        self.apply(EngineEvent::Faulted);
    }

    /// Stop immediately and empty the queue
    pub fn abort(&mut self, clear_accumulators: bool) -> AbortReport {
        let mut report = AbortReport::default();
        if let Some(active) = self.active.take() {
            report.interrupted = true;
            report.remaining = active.remaining();
        }
        while self.queue.dequeue().is_some() {
            report.discarded += 1;
        }
        if clear_accumulators {
            self.position.clear_accumulators(ClearFlags::BOTH);
        }
        self.apply(EngineEvent::Aborted);
        report
    }

    /// Zero both step counters and accumulators
    pub fn clear_position(&mut self) {
        self.position.zero();
    }

    /// Abort, zero position and forget any pending fault
    pub fn reset(&mut self) {
        self.abort(true);
        self.position.zero();
        self.fault = None;
    }

    /// Take the last fault, if the foreground has not seen it yet
    pub fn take_fault(&mut self) -> Option<EngineFault> {
        self.fault.take()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            position: self.position.steps(),
            carry: self.position.carry(),
            phase: self.phase,
            queued: self.queue.len(),
            active: self.active.as_ref().map(ActiveMove::kind),
            axes_moving: self
                .active
                .as_ref()
                .map_or([false, false], ActiveMove::axes_moving),
        }
    }
}
