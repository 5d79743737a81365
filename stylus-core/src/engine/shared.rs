//! Engine access across execution contexts
//!
//! The engine tick runs at interrupt priority while the foreground parses
//! host lines. Everything the foreground needs from the engine goes through
//! a `critical_section::Mutex`, so it always sees a state between two
//! ticks and never a half-updated one.

use core::cell::RefCell;

use critical_section::Mutex;

use super::{AbortReport, Engine, EngineSnapshot, TickOutcome};
use crate::error::EngineFault;
use crate::traits::StepOutput;

/// Engine behind a critical-section mutex
pub struct SharedEngine<'q, const N: usize> {
    inner: Mutex<RefCell<Engine<'q, N>>>,
}

impl<'q, const N: usize> SharedEngine<'q, N> {
    pub const fn new(engine: Engine<'q, N>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Run one engine period
    pub fn tick(&self, out: &mut impl StepOutput) -> TickOutcome {
        self.with(|engine| engine.tick(out))
    }

    /// Run `f` on the engine inside a critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine<'q, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.with(|engine| engine.snapshot())
    }
}

/// The foreground's view of the engine
pub trait EngineLink {
    fn snapshot(&mut self) -> EngineSnapshot;

    /// Stop now and empty the queue
    fn abort(&mut self, clear_accumulators: bool) -> AbortReport;

    fn clear_position(&mut self);

    fn reset(&mut self);

    /// Fault recorded since the last call
    fn take_fault(&mut self) -> Option<EngineFault>;

    /// Yield until the engine has had a chance to make progress
    fn wait(&mut self);
}

/// [`EngineLink`] over a [`SharedEngine`] with a caller-supplied wait
///
/// On hardware `wait` sleeps until the next interrupt; in host tests it
/// ticks the engine directly.
pub struct SharedLink<'a, 'q, const N: usize, W: FnMut()> {
    engine: &'a SharedEngine<'q, N>,
    wait: W,
}

impl<'a, 'q, const N: usize, W: FnMut()> SharedLink<'a, 'q, N, W> {
    pub fn new(engine: &'a SharedEngine<'q, N>, wait: W) -> Self {
        Self { engine, wait }
    }
}

impl<const N: usize, W: FnMut()> EngineLink for SharedLink<'_, '_, N, W> {
    fn snapshot(&mut self) -> EngineSnapshot {
        self.engine.snapshot()
    }

    fn abort(&mut self, clear_accumulators: bool) -> AbortReport {
        self.engine.with(|engine| engine.abort(clear_accumulators))
    }

    fn clear_position(&mut self) {
        self.engine.with(|engine| engine.clear_position());
    }

    fn reset(&mut self) {
        self.engine.with(|engine| engine.reset());
    }

    fn take_fault(&mut self) -> Option<EngineFault> {
        self.engine.with(|engine| engine.take_fault())
    }

    fn wait(&mut self) {
        (self.wait)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{LineSegment, MotionCommand};
    use crate::queue::CommandRing;
    use crate::testing::Recorder;
    use heapless::spsc::Queue;

    #[test]
    fn test_link_sees_engine_progress() {
        let mut ring: CommandRing<4> = Queue::new();
        let (mut producer, consumer) = ring.split();
        let engine = SharedEngine::new(Engine::new(consumer, 25_000));
        let out = RefCell::new(Recorder::default());

        producer
            .enqueue(MotionCommand::Segment(LineSegment {
                frequency_hz: 25_000,
                steps: [3, -2],
            }))
            .unwrap();

        let mut link = SharedLink::new(&engine, || {
            engine.tick(&mut *out.borrow_mut());
        });
        assert!(link.snapshot().is_executing());
        while !link.snapshot().is_idle() {
            link.wait();
        }
        assert_eq!(link.snapshot().position, [3, -2]);
        assert_eq!(out.borrow().steps, [3, -2]);

        link.clear_position();
        assert_eq!(link.snapshot().position, [0, 0]);
        assert_eq!(link.take_fault(), None);
    }

    #[test]
    fn test_engine_ticks_from_another_thread() {
        let mut ring: CommandRing<4> = Queue::new();
        let (mut producer, consumer) = ring.split();
        let engine = SharedEngine::new(Engine::new(consumer, 25_000));
        producer
            .enqueue(MotionCommand::Segment(LineSegment {
                frequency_hz: 25_000,
                steps: [500, 200],
            }))
            .unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut out = Recorder::default();
                while !engine.snapshot().is_idle() {
                    engine.tick(&mut out);
                }
            });
            // Snapshots never tear: the secondary axis tracks the primary
            loop {
                let snap = engine.snapshot();
                let [a, b] = snap.position;
                assert!(b <= a && b * 5 >= a * 2 - 5);
                if snap.is_idle() {
                    break;
                }
            }
        });
        assert_eq!(engine.snapshot().position, [500, 200]);
    }
}
