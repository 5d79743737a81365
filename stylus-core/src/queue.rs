//! Command queue between the foreground and the engine
//!
//! A lock-free single-producer single-consumer ring from `heapless`: the
//! foreground owns the [`Producer`] through [`CommandQueue`], the engine
//! owns the [`Consumer`]. Only the producer moves the tail and only the
//! consumer moves the head, so neither side ever waits on the other.
//!
//! The ring's storage capacity is fixed at build time (`N - 1` entries).
//! The logical depth can be lowered at runtime, but only while the queue is
//! empty.

use heapless::spsc::{Consumer, Producer, Queue};

use crate::command::MotionCommand;
use crate::error::ErrorKind;

/// Ring storage for `N - 1` commands
pub type CommandRing<const N: usize> = Queue<MotionCommand, N>;

/// Engine side of the queue
pub type CommandConsumer<'q, const N: usize> = Consumer<'q, MotionCommand, N>;

/// Foreground side of the queue
pub struct CommandQueue<'q, const N: usize> {
    producer: Producer<'q, MotionCommand, N>,
    depth: usize,
}

impl<'q, const N: usize> CommandQueue<'q, N> {
    /// Largest logical depth the storage allows
    pub const MAX_DEPTH: usize = N - 1;

    /// Wrap a producer with the given logical depth
    pub fn new(producer: Producer<'q, MotionCommand, N>, depth: usize) -> Result<Self, ErrorKind> {
        if depth == 0 || depth > Self::MAX_DEPTH {
            return Err(ErrorKind::ParameterOutsideLimit);
        }
        Ok(Self { producer, depth })
    }

    /// Configured logical depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Commands waiting for the engine
    pub fn len(&self) -> usize {
        self.producer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.depth
    }

    /// Change the logical depth
    ///
    /// Refused unless the queue is empty.
    pub fn set_depth(&mut self, depth: usize) -> Result<(), ErrorKind> {
        if depth == 0 || depth > Self::MAX_DEPTH || !self.is_empty() {
            return Err(ErrorKind::ParameterOutsideLimit);
        }
        self.depth = depth;
        Ok(())
    }

    /// Append a command without waiting
    ///
    /// Returns the command back when the queue is at its logical depth.
    pub fn try_enqueue(&mut self, command: MotionCommand) -> Result<(), MotionCommand> {
        if self.is_full() {
            return Err(command);
        }
        self.producer.enqueue(command)
    }

    /// Append a command, calling `wait` until there is room
    ///
    /// The engine drains the queue from its own context, so this always
    /// terminates while the engine is running.
    pub fn enqueue_blocking(&mut self, command: MotionCommand, mut wait: impl FnMut()) {
        let mut pending = command;
        while let Err(returned) = self.try_enqueue(pending) {
            pending = returned;
            wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(ticks: u64) -> MotionCommand {
        MotionCommand::Delay { ticks }
    }

    #[test]
    fn test_fifo_order() {
        let mut ring: CommandRing<8> = Queue::new();
        let (producer, mut consumer) = ring.split();
        let mut queue = CommandQueue::new(producer, 7).unwrap();

        for t in 1..=3 {
            queue.try_enqueue(delay(t)).unwrap();
        }
        assert_eq!(queue.len(), 3);
        for t in 1..=3 {
            assert_eq!(consumer.dequeue(), Some(delay(t)));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_logical_depth_limits_enqueue() {
        let mut ring: CommandRing<8> = Queue::new();
        let (producer, _consumer) = ring.split();
        let mut queue = CommandQueue::new(producer, 2).unwrap();

        queue.try_enqueue(delay(1)).unwrap();
        queue.try_enqueue(delay(2)).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.try_enqueue(delay(3)), Err(delay(3)));
    }

    #[test]
    fn test_depth_only_changes_when_empty() {
        let mut ring: CommandRing<8> = Queue::new();
        let (producer, mut consumer) = ring.split();
        let mut queue = CommandQueue::new(producer, 4).unwrap();

        queue.try_enqueue(delay(1)).unwrap();
        assert_eq!(queue.set_depth(2), Err(ErrorKind::ParameterOutsideLimit));
        consumer.dequeue();
        assert_eq!(queue.set_depth(2), Ok(()));
        assert_eq!(queue.depth(), 2);
        assert_eq!(queue.set_depth(8), Err(ErrorKind::ParameterOutsideLimit));
        assert_eq!(queue.set_depth(0), Err(ErrorKind::ParameterOutsideLimit));
    }

    #[test]
    fn test_depth_bounds_at_construction() {
        let mut ring: CommandRing<4> = Queue::new();
        let (producer, _consumer) = ring.split();
        assert!(CommandQueue::new(producer, 4).is_err());
    }

    #[test]
    fn test_enqueue_blocking_waits_for_room() {
        let mut ring: CommandRing<4> = Queue::new();
        let (producer, consumer) = ring.split();
        let mut queue = CommandQueue::new(producer, 1).unwrap();
        let consumer = core::cell::RefCell::new(consumer);

        queue.try_enqueue(delay(1)).unwrap();
        let mut waits = 0;
        queue.enqueue_blocking(delay(2), || {
            waits += 1;
            consumer.borrow_mut().dequeue();
        });
        assert_eq!(waits, 1);
        assert_eq!(consumer.borrow_mut().dequeue(), Some(delay(2)));
    }
}
