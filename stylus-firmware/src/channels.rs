//! Inter-task communication
//!
//! Statics shared between the engine task (interrupt priority) and the
//! host task (thread mode).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

use stylus_core::error::EngineFault;

/// Queue storage slots; one is always kept free, so the deepest logical
/// queue holds 64 commands
pub const QUEUE_SLOTS: usize = 65;

/// Fault raised by the engine tick, for logging
///
/// The controller harvests the same fault from the engine for its error
/// state; this copy only feeds the log.
pub static ENGINE_FAULT: Signal<CriticalSectionRawMutex, EngineFault> = Signal::new();

/// Engine ticks since boot
pub static TICK_COUNT: AtomicU32 = AtomicU32::new(0);

/// Current tick count
pub fn ticks() -> u32 {
    TICK_COUNT.load(Ordering::Relaxed)
}
