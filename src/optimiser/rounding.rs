//! Kitchen Rounding

use crate::optimiser::ROUNDING_STEP_G;

/// Absorbs float noise such as 49.999999999 g before flooring.
const GRID_EPSILON: f64 = 1e-9;

/// Rounds `value` to the nearest multiple of `step`, halves away from zero.
///
/// Non-positive or non-finite steps leave the value untouched.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }

    (value / step).round() * step
}

/// Rounds `value` down to a multiple of `step`.
///
/// Non-positive or non-finite steps leave the value untouched.
pub fn floor_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }

    (value / step + GRID_EPSILON).floor() * step
}

/// Rounds to the nearest 5 g, then lifts the result back to the quantity floor.
///
/// The floor wins: with a floor that is not a multiple of 5 g, floored rows are not
/// multiples of 5 g either.
pub fn kitchen_quantity(value: f64, min_quantity_g: f64) -> f64 {
    round_to_step(value, ROUNDING_STEP_G).max(min_quantity_g)
}

/// Rounds down to 5 g, then lifts the result back to the quantity floor.
///
/// Never exceeds `value` unless the floor does.
pub fn kitchen_quantity_down(value: f64, min_quantity_g: f64) -> f64 {
    floor_to_step(value, ROUNDING_STEP_G).max(min_quantity_g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_step() {
        assert!((round_to_step(66.67, 5.0) - 65.0).abs() < f64::EPSILON);
        assert!((round_to_step(67.5, 5.0) - 70.0).abs() < f64::EPSILON);
        assert!((round_to_step(51.0, 5.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degenerate_step_is_a_no_op() {
        assert!((round_to_step(12.3, 0.0) - 12.3).abs() < f64::EPSILON);
        assert!((round_to_step(12.3, f64::NAN) - 12.3).abs() < f64::EPSILON);
    }

    #[test]
    fn floors_to_step_despite_float_noise() {
        assert!((floor_to_step(147.8, 5.0) - 145.0).abs() < f64::EPSILON);
        assert!((floor_to_step(49.999_999_999_9, 5.0) - 50.0).abs() < f64::EPSILON);
        assert!((floor_to_step(50.000_000_01, 5.0) - 50.0).abs() < f64::EPSILON);
        assert!((floor_to_step(12.3, -1.0) - 12.3).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_down_never_overshoots() {
        for value in [149.0, 147.78, 66.67, 12.0, 5.5] {
            assert!(kitchen_quantity_down(value, 5.0) <= value, "{value}");
        }

        assert!((kitchen_quantity_down(3.0, 5.0) - 5.0).abs() < f64::EPSILON);
        assert!((kitchen_quantity_down(9.0, 7.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn floor_overrides_rounding() {
        assert!((kitchen_quantity(1.0, 5.0) - 5.0).abs() < f64::EPSILON);
        assert!((kitchen_quantity(8.0, 7.0) - 10.0).abs() < f64::EPSILON);
        assert!((kitchen_quantity(6.0, 7.0) - 7.0).abs() < f64::EPSILON);
    }
}
