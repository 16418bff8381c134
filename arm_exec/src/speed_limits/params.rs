//! Parameters structure for the speed limit store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters seeding the speed limit store at startup.
///
/// Only the joint servo group is seeded from file, all other groups start from
/// their built in defaults and are changed at run time by telecommand.
#[derive(Debug, Deserialize)]
pub struct SpeedLimitsParams {
    /// Initial relative velocity factor for joint servo motions.
    ///
    /// Units: fraction of the controller maximum, dimensionless
    pub joint_servo_relative_velocity: f64,

    /// Initial relative acceleration factor for joint servo motions.
    ///
    /// Units: fraction of the controller maximum, dimensionless
    pub joint_servo_relative_acceleration: f64,
}
