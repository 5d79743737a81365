//! Mixed-axis geometry
//!
//! Two logical axes `a` and `b` driven by two motors: the first motor
//! moves `a + b`, the second `a - b`.

/// Physical deltas of a mixed-axis move, `None` if either overflows `i32`
pub fn mixed_to_axes(a: i32, b: i32) -> Option<[i32; 2]> {
    Some([a.checked_add(b)?, a.checked_sub(b)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_offsets_move_first_axis_only() {
        assert_eq!(mixed_to_axes(50, 50), Some([100, 0]));
        assert_eq!(mixed_to_axes(50, -50), Some([0, 100]));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(mixed_to_axes(i32::MAX, 1), None);
        assert_eq!(mixed_to_axes(i32::MIN, 1), None);
        assert_eq!(mixed_to_axes(0, i32::MIN), None);
    }

    proptest! {
        #[test]
        fn prop_matches_wide_arithmetic(a in any::<i32>(), b in any::<i32>()) {
            let sum = i64::from(a) + i64::from(b);
            let diff = i64::from(a) - i64::from(b);
            match mixed_to_axes(a, b) {
                Some([first, second]) => {
                    prop_assert_eq!(i64::from(first), sum);
                    prop_assert_eq!(i64::from(second), diff);
                }
                None => prop_assert!(i32::try_from(sum).is_err() || i32::try_from(diff).is_err()),
            }
        }
    }
}
