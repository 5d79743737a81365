//! Events that trigger engine phase transitions

/// Events produced by the engine tick and by foreground requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineEvent {
    /// A command was dequeued and its integrator set up
    CommandLoaded,
    /// One tick of integration ran
    TickIntegrated,
    /// The command's termination condition was met
    TargetReached,
    /// A completed command was released
    Retired,
    /// Emergency stop or reset
    Aborted,
    /// A rate fault ended the command early
    Faulted,
}
