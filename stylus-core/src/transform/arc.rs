//! Circular arc tracing
//!
//! Arcs are walked one grid step at a time along the start radius, in the
//! style of a midpoint circle algorithm generalised to an arbitrary center
//! and end point. The unit moves are grouped into short chords; each chord
//! then runs as an ordinary straight line.
//!
//! All points are relative to the current position, so the arc starts at
//! the origin.

use crate::command::{ArcMove, LineSegment, Winding};
use crate::config::MotionLimits;

use super::line::StraightLine;

/// Candidate unit moves, diagonals first, then horizontal, then vertical
const NEIGHBOURS: [(i64, i64); 8] = [
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Tracing,
    Closing,
    Done,
}

/// Iterator over the chords of one arc
///
/// The chords sum to the destination exactly.
#[derive(Debug, Clone)]
pub struct ArcPath {
    winding: Winding,
    destination: [i32; 2],
    /// Current point relative to the center
    point: [i64; 2],
    /// Destination relative to the center
    target: [i64; 2],
    radius_sq: i64,
    chord_len: u16,
    chord: [i32; 2],
    chord_moves: u16,
    emitted: [i32; 2],
    /// Unit moves left before the walk gives up and closes
    budget: u64,
    /// Set once the destination lies ahead within half a turn
    armed: bool,
    stage: Stage,
}

impl ArcPath {
    pub fn new(arc: &ArcMove, chord_len: u16) -> Self {
        let destination = [i32::from(arc.destination[0]), i32::from(arc.destination[1])];
        let center = [i64::from(arc.center[0]), i64::from(arc.center[1])];
        let point = [-center[0], -center[1]];
        let target = [
            i64::from(destination[0]) - center[0],
            i64::from(destination[1]) - center[1],
        ];

        // Zero radius at either end has no usable circle
        let degenerate = point == [0, 0] || target == [0, 0];

        Self {
            winding: arc.winding,
            destination,
            point,
            target,
            radius_sq: point[0] * point[0] + point[1] * point[1],
            chord_len: chord_len.max(1),
            chord: [0, 0],
            chord_moves: 0,
            emitted: [0, 0],
            budget: 8 * (point[0].unsigned_abs() + point[1].unsigned_abs() + 1),
            armed: false,
            stage: if degenerate {
                Stage::Closing
            } else {
                Stage::Tracing
            },
        }
    }

    /// Whether the arc collapsed to a single straight move
    pub fn is_straight(&self) -> bool {
        self.stage == Stage::Closing && self.emitted == [0, 0] && self.chord_moves == 0
    }

    /// Direction of travel at the current point
    fn tangent(&self) -> [i64; 2] {
        let [x, y] = self.point;
        match self.winding {
            Winding::CounterClockwise => [-y, x],
            Winding::Clockwise => [y, -x],
        }
    }

    /// Positive while the destination lies ahead within half a turn
    fn cross(&self) -> i64 {
        let [x, y] = self.point;
        let [tx, ty] = self.target;
        let ccw = x * ty - y * tx;
        match self.winding {
            Winding::CounterClockwise => ccw,
            Winding::Clockwise => -ccw,
        }
    }

    fn dot(&self) -> i64 {
        self.point[0] * self.target[0] + self.point[1] * self.target[1]
    }

    /// Best unit move along the tangent
    fn next_move(&self) -> Option<(i64, i64)> {
        let [tx, ty] = self.tangent();
        let [x, y] = self.point;
        let mut best: Option<((i64, i64), i64)> = None;
        for &(dx, dy) in NEIGHBOURS.iter() {
            if dx * tx + dy * ty <= 0 {
                continue;
            }
            let (nx, ny) = (x + dx, y + dy);
            let error = (nx * nx + ny * ny - self.radius_sq).abs();
            if best.map_or(true, |(_, e)| error < e) {
                best = Some(((dx, dy), error));
            }
        }
        best.map(|(m, _)| m)
    }

    /// Walk one unit move; returns false when tracing is over
    fn advance(&mut self) -> bool {
        if self.budget == 0 {
            return false;
        }
        let Some((dx, dy)) = self.next_move() else {
            return false;
        };
        self.budget -= 1;
        self.point[0] += dx;
        self.point[1] += dy;
        self.chord[0] += dx as i32;
        self.chord[1] += dy as i32;
        self.chord_moves += 1;

        let cross = self.cross();
        if self.armed && cross <= 0 && self.dot() > 0 {
            return false;
        }
        if cross > 0 {
            self.armed = true;
        }
        true
    }
}

impl Iterator for ArcPath {
    type Item = [i32; 2];

    fn next(&mut self) -> Option<[i32; 2]> {
        while self.stage == Stage::Tracing {
            if !self.advance() {
                self.stage = Stage::Closing;
                break;
            }
            if self.chord_moves >= self.chord_len {
                let chord = self.chord;
                self.emitted[0] += chord[0];
                self.emitted[1] += chord[1];
                self.chord = [0, 0];
                self.chord_moves = 0;
                return Some(chord);
            }
        }

        if self.stage == Stage::Closing {
            self.stage = Stage::Done;
            // The last partial chord is folded into the closing one
            let rest = [
                self.destination[0] - self.emitted[0],
                self.destination[1] - self.emitted[1],
            ];
            if rest != [0, 0] {
                return Some(rest);
            }
        }
        None
    }
}

/// Line segments for an arc, each chord split as a straight line
pub fn arc_segments(
    arc: &ArcMove,
    limits: &MotionLimits,
) -> impl Iterator<Item = LineSegment> {
    let frequency_hz = arc.frequency_hz;
    let min_rate = limits.min_secondary_rate_centihz;
    ArcPath::new(arc, limits.arc_segment_steps)
        .flat_map(move |chord| StraightLine::new(chord, frequency_hz, min_rate))
}
