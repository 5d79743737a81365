//! Engine phase state machine
//!
//! The engine runs one command at a time. Its phase is a function of the
//! current phase and the event the tick just produced.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::events::EngineEvent;

/// Engine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EnginePhase {
    /// No command in flight, ready to load
    #[default]
    Idle,
    /// Command pulled from the queue, integrator initialised
    Loaded,
    /// Command advancing one tick at a time
    Running,
    /// Final tick done and step count reconciled; retired on the next tick
    Completing,
}

impl EnginePhase {
    /// Process an event and return the next phase
    pub fn transition(self, event: EngineEvent) -> Self {
        use EngineEvent::*;
        use EnginePhase::*;

        match (self, event) {
            (Idle, CommandLoaded) => Loaded,

            (Loaded, TickIntegrated) => Running,
            (Running, TickIntegrated) => Running,
            (Loaded | Running, TargetReached) => Completing,

            (Completing, Retired) => Idle,

            // Abort and fault always land in Idle
            (_, Aborted) => Idle,
            (_, Faulted) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let phase = EnginePhase::Idle
            .transition(EngineEvent::CommandLoaded)
            .transition(EngineEvent::TickIntegrated);
        assert_eq!(phase, EnginePhase::Running);

        let phase = phase.transition(EngineEvent::TargetReached);
        assert_eq!(phase, EnginePhase::Completing);
        assert_eq!(phase.transition(EngineEvent::Retired), EnginePhase::Idle);
    }

    #[test]
    fn test_single_tick_command() {
        let phase = EnginePhase::Idle
            .transition(EngineEvent::CommandLoaded)
            .transition(EngineEvent::TargetReached);
        assert_eq!(phase, EnginePhase::Completing);
    }

    #[test]
    fn test_abort_and_fault_return_to_idle() {
        for phase in [
            EnginePhase::Loaded,
            EnginePhase::Running,
            EnginePhase::Completing,
        ] {
            assert_eq!(phase.transition(EngineEvent::Aborted), EnginePhase::Idle);
            assert_eq!(phase.transition(EngineEvent::Faulted), EnginePhase::Idle);
        }
    }

    #[test]
    fn test_ignored_events() {
        assert_eq!(
            EnginePhase::Idle.transition(EngineEvent::TickIntegrated),
            EnginePhase::Idle
        );
        assert_eq!(
            EnginePhase::Running.transition(EngineEvent::CommandLoaded),
            EnginePhase::Running
        );
    }
}
