//! Engine phase state machine
//!
//! The phase is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::EngineEvent;
pub use machine::EnginePhase;
