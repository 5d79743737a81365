//! Straight-line segments for frequency-driven moves
//!
//! The longer (primary) axis steps at the requested frequency and the other
//! (secondary) axis is rate-matched to it. When that matched rate would
//! drop below the slowest rate a driver handles reliably, the line is cut
//! into a staircase instead: the primary axis runs alone between secondary
//! steps, and each secondary step is taken together with a short run of
//! primary steps so its own rate stays above the minimum.
//!
//! Segments are produced lazily in path order. Their sum is always the
//! requested delta.

use crate::command::LineSegment;

#[derive(Debug, Clone, Copy)]
enum Plan {
    /// One segment, or none for a zero-length line
    Single(Option<LineSegment>),
    Staircase(Staircase),
}

#[derive(Debug, Clone, Copy)]
struct Staircase {
    /// Secondary steps taken so far
    taken: u32,
    /// Primary steps covered so far
    covered: u32,
    /// Longest primary run that may share a segment with one secondary step
    window: u32,
    /// Combined segment waiting behind a primary-only run
    pending: Option<LineSegment>,
}

/// Iterator over the segments of one straight line
#[derive(Debug, Clone)]
pub struct StraightLine {
    frequency_hz: u32,
    /// Index of the primary axis
    primary: usize,
    signs: [i32; 2],
    primary_steps: u32,
    secondary_steps: u32,
    plan: Plan,
}

impl StraightLine {
    /// Plan a line of `steps` with the primary axis at `frequency_hz`
    ///
    /// `min_rate_centihz` is the slowest acceptable secondary rate in
    /// hundredths of a hertz.
    pub fn new(steps: [i32; 2], frequency_hz: u32, min_rate_centihz: u32) -> Self {
        let magnitude = [steps[0].unsigned_abs(), steps[1].unsigned_abs()];
        let primary = if magnitude[0] >= magnitude[1] { 0 } else { 1 };
        let primary_steps = magnitude[primary];
        let secondary_steps = magnitude[1 - primary];

        let whole = LineSegment {
            frequency_hz,
            steps,
        };
        let secondary_rate_centihz =
            u64::from(secondary_steps) * u64::from(frequency_hz) * 100;
        let too_slow = secondary_steps > 0
            && secondary_steps < primary_steps
            && secondary_rate_centihz < u64::from(min_rate_centihz) * u64::from(primary_steps);

        let plan = if too_slow {
            let window = (u64::from(frequency_hz) * 100 / u64::from(min_rate_centihz.max(1)))
                .clamp(1, u64::from(u32::MAX)) as u32;
            Plan::Staircase(Staircase {
                taken: 0,
                covered: 0,
                window,
                pending: None,
            })
        } else if whole.is_empty() {
            Plan::Single(None)
        } else {
            Plan::Single(Some(whole))
        };

        Self {
            frequency_hz,
            primary,
            signs: [steps[0].signum(), steps[1].signum()],
            primary_steps,
            secondary_steps,
            plan,
        }
    }

    /// Whether the line had to be split
    pub fn is_split(&self) -> bool {
        matches!(self.plan, Plan::Staircase(_))
    }

    fn segment(&self, primary: u32, secondary: u32) -> LineSegment {
        let mut steps = [0i32; 2];
        // Magnitudes never exceed the original |steps|, which fit i32 with
        // the sign applied.
        steps[self.primary] = (i64::from(primary) * i64::from(self.signs[self.primary])) as i32;
        steps[1 - self.primary] =
            (i64::from(secondary) * i64::from(self.signs[1 - self.primary])) as i32;
        LineSegment {
            frequency_hz: self.frequency_hz,
            steps,
        }
    }
}

impl Iterator for StraightLine {
    type Item = LineSegment;

    fn next(&mut self) -> Option<LineSegment> {
        let mut stairs = match &mut self.plan {
            Plan::Single(segment) => return segment.take(),
            Plan::Staircase(stairs) => *stairs,
        };

        if let Some(segment) = stairs.pending.take() {
            self.plan = Plan::Staircase(stairs);
            return Some(segment);
        }
        if stairs.taken >= self.secondary_steps {
            return None;
        }

        // Primary position of the next secondary step, round(j * p / s)
        stairs.taken += 1;
        let p = u64::from(self.primary_steps);
        let s = u64::from(self.secondary_steps);
        let target = ((2 * u64::from(stairs.taken) * p + s) / (2 * s)) as u32;
        let gap = target - stairs.covered;
        stairs.covered = target;

        let shared = gap.min(stairs.window);
        let combined = self.segment(shared, 1);
        let run = gap - shared;

        let next = if run > 0 {
            stairs.pending = Some(combined);
            self.segment(run, 0)
        } else {
            combined
        };
        self.plan = Plan::Staircase(stairs);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const MIN_RATE: u32 = 131;

    fn collect(steps: [i32; 2], freq: u32) -> Vec<LineSegment> {
        StraightLine::new(steps, freq, MIN_RATE).collect()
    }

    fn sum(segments: &[LineSegment]) -> [i64; 2] {
        segments.iter().fold([0, 0], |acc, s| {
            [acc[0] + i64::from(s.steps[0]), acc[1] + i64::from(s.steps[1])]
        })
    }

    #[test]
    fn test_ordinary_line_is_single_segment() {
        let segments = collect([1000, 300], 1000);
        assert_eq!(
            segments,
            [LineSegment {
                frequency_hz: 1000,
                steps: [1000, 300]
            }]
        );
    }

    #[test]
    fn test_zero_line_is_empty() {
        assert!(collect([0, 0], 1000).is_empty());
    }

    #[test]
    fn test_single_axis_never_split() {
        let line = StraightLine::new([0, -50_000], 2, MIN_RATE);
        assert!(!line.is_split());
        assert_eq!(line.count(), 1);
    }

    #[test]
    fn test_slow_secondary_becomes_staircase() {
        // 3 secondary steps over 10000 primary at 100 Hz is 0.03 Hz
        let line = StraightLine::new([10_000, -3], 100, MIN_RATE);
        assert!(line.is_split());
        let segments: Vec<_> = line.collect();
        assert_eq!(sum(&segments), [10_000, -3]);

        // window = floor(100 / 1.31) = 76 primary steps per secondary step
        for seg in segments.iter().filter(|s| s.steps[1] != 0) {
            assert_eq!(seg.steps[1], -1);
            assert!(seg.steps[0] <= 76 && seg.steps[0] >= 1);
            let rate_centihz = 100 * 100 / seg.steps[0] as u32;
            assert!(rate_centihz >= MIN_RATE);
        }
        assert!(segments.iter().all(|s| s.steps[0] >= 0 && s.steps[1] <= 0));
    }

    #[test]
    fn test_staircase_on_second_axis() {
        let segments = collect([-1, 40_000], 10);
        assert_eq!(sum(&segments), [-1, 40_000]);
        assert!(segments.len() >= 2);
    }

    #[test]
    fn test_secondary_steps_spread_along_line() {
        let segments = collect([9_000, 3], 50);
        let mut primary = 0i64;
        let mut positions = Vec::new();
        for seg in &segments {
            primary += i64::from(seg.steps[0]);
            if seg.steps[1] != 0 {
                positions.push(primary);
            }
        }
        assert_eq!(positions, [3_000, 6_000, 9_000]);
    }

    proptest::proptest! {
        #[test]
        fn prop_segments_sum_to_line(
            a in -200_000i32..200_000,
            b in -200_000i32..200_000,
            freq in 2u32..=25_000,
        ) {
            let segments = collect([a, b], freq);
            proptest::prop_assert_eq!(sum(&segments), [i64::from(a), i64::from(b)]);
            for seg in &segments {
                proptest::prop_assert!(!seg.is_empty());
                proptest::prop_assert_eq!(seg.frequency_hz, freq);
            }
        }
    }
}
