//! # Controller unit conversions
//!
//! The software holds and communicates translational quantities in SI
//! metre-based units, while the motion controller natively works in
//! millimetre-based units. These helpers convert at the point where values
//! are written into a motion demand.

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of millimetres in a metre.
pub const MM_PER_M: f64 = 1000.0;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a translational value from metre-based to controller native
/// millimetre-based units.
///
/// The same scale applies to velocity (m/s to mm/s), acceleration (m/s^2 to
/// mm/s^2) and jerk (m/s^3 to mm/s^3).
pub fn translation_to_ctrl_units(value: f64) -> f64 {
    value * MM_PER_M
}

/// Convert a per-axis translational vector from metre-based to controller
/// native millimetre-based units.
pub fn translation_vector_to_ctrl_units(value: [f64; 3]) -> [f64; 3] {
    [
        value[0] * MM_PER_M,
        value[1] * MM_PER_M,
        value[2] * MM_PER_M,
    ]
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_translation_to_ctrl_units() {
        assert_eq!(translation_to_ctrl_units(2.0), 2000.0);
        assert_eq!(translation_to_ctrl_units(0.0), 0.0);
        assert_eq!(translation_to_ctrl_units(-1.0), -1000.0);
    }

    #[test]
    fn test_translation_vector_to_ctrl_units() {
        assert_eq!(
            translation_vector_to_ctrl_units([1.0, 0.5, 0.0]),
            [1000.0, 500.0, 0.0]
        );
    }
}
