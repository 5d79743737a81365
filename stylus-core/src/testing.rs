//! Test doubles shared by the unit tests

use std::vec::Vec;

use crate::traits::{Axis, Direction, StepOutput};

/// Step output that records everything the engine drives
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    /// Net steps per axis, signed by the direction output
    pub steps: [i64; 2],
    /// Direction outputs as last set
    pub directions: [Direction; 2],
    /// Every direction change per axis, in order
    pub directions_set: [Vec<Direction>; 2],
    /// Axis index of every step pulse, in order
    pub order: Vec<usize>,
    /// Calls to `begin_tick`
    pub ticks: u64,
}

impl StepOutput for Recorder {
    fn begin_tick(&mut self) {
        self.ticks += 1;
    }

    fn set_direction(&mut self, axis: Axis, direction: Direction) {
        self.directions[axis.index()] = direction;
        self.directions_set[axis.index()].push(direction);
    }

    fn step(&mut self, axis: Axis) {
        let i = axis.index();
        self.steps[i] += i64::from(self.directions[i].delta());
        self.order.push(i);
    }
}
