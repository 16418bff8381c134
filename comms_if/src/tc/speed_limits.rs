//! # Speed limit telecommands
//!
//! These commands reconfigure the speed limits held by the executive and
//! applied to every motion immediately before it is dispatched to the motion
//! controller.
//!
//! All fields share one wire convention: a value of zero or below means "no
//! override requested", leaving the controller's own default in force for
//! that field. Because non-positive values are meaningful they are never
//! rejected by validation; validation only rejects values that can carry no
//! meaning at all (NaN or infinite) and relative factors beyond the
//! controller's documented range.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use super::Vector3;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Highest value accepted for relative (dimensionless) factors.
///
/// The controller documents the acceleration override as valid between 0 and
/// 10, and no other relative factor has a meaning above full rate, so
/// anything beyond this is taken as an operator error.
pub const MAX_RELATIVE_FACTOR: f64 = 10.0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A speed limit reconfiguration command.
///
/// Each variant overwrites the stored limits for one motion mode in full,
/// including any non-positive "leave controller default" values it carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum SpeedLimitsCmd {
    /// Set the limits applied to continuous joint-space servo motion.
    #[structopt(name = "joint-servo")]
    SetJointServo {
        /// Joint velocity limit as a fraction of the controller's maximum
        /// rated joint velocity.
        ///
        /// Units: dimensionless, nominal range (0, 1]. Zero or below leaves
        /// the controller default in force.
        relative_velocity: f64,

        /// Joint acceleration limit as a fraction of the controller's maximum
        /// rated joint acceleration.
        ///
        /// Units: dimensionless, nominal range (0, 1]. Zero or below leaves
        /// the controller default in force.
        relative_acceleration: f64,

        /// Scaling factor applied by the controller on top of the
        /// acceleration limit.
        ///
        /// Units: dimensionless, valid range (0, 10]. Zero or below leaves
        /// the controller default in force.
        acceleration_override: f64,
    },

    /// Set the limits applied to point-to-point joint motion.
    #[structopt(name = "ptp-joint")]
    SetPtpJoint {
        /// Joint velocity limit as a fraction of the controller's maximum
        /// rated joint velocity.
        ///
        /// Units: dimensionless, nominal range (0, 1]. Zero or below leaves
        /// the controller default in force.
        relative_velocity: f64,

        /// Joint acceleration limit as a fraction of the controller's maximum
        /// rated joint acceleration.
        ///
        /// Units: dimensionless, nominal range (0, 1]. Zero or below leaves
        /// the controller default in force.
        relative_acceleration: f64,
    },

    /// Set the limits applied to point-to-point Cartesian motion.
    #[structopt(name = "ptp-cart")]
    SetPtpCartesian {
        /// Translational velocity limit.
        ///
        /// Units: meters/second. Zero or below leaves the controller default
        /// in force.
        cart_velocity_ms: f64,

        /// Orientation velocity limit.
        ///
        /// Units: radians/second. Zero or below leaves the controller default
        /// in force.
        orientation_velocity_rads: f64,

        /// Translational acceleration limit.
        ///
        /// Units: meters/second^2. Zero or below leaves the controller
        /// default in force.
        cart_acceleration_ms2: f64,

        /// Orientation acceleration limit.
        ///
        /// Units: radians/second^2. Zero or below leaves the controller
        /// default in force.
        orientation_acceleration_rads2: f64,

        /// Translational jerk limit.
        ///
        /// Units: meters/second^3. Zero or below leaves the controller
        /// default in force.
        cart_jerk_ms3: f64,

        /// Orientation jerk limit.
        ///
        /// Units: radians/second^3. Zero or below leaves the controller
        /// default in force.
        orientation_jerk_rads3: f64,
    },

    /// Set the limits applied to continuous Cartesian servo motion.
    ///
    /// The two vectors are each applied as a unit: if any component of a
    /// vector is above zero the whole vector is applied, including its
    /// non-positive components.
    #[structopt(name = "cart-servo")]
    SetCartesianServo {
        /// Translational velocity limit per axis, written as `x,y,z`.
        ///
        /// Units: meters/second.
        trans_velocity_ms: Vector3,

        /// Rotational velocity limit per axis, written as `x,y,z`.
        ///
        /// Units: radians/second.
        rot_velocity_rads: Vector3,
    },

    /// Set the global override reduction factor.
    ///
    /// The factor is stored and readable but is not folded into any of the
    /// per-mode limits on application.
    #[structopt(name = "override-reduction")]
    SetOverrideReduction {
        /// Uniform motion scaling factor.
        ///
        /// Units: dimensionless, nominal range (0, 1].
        factor: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SpeedLimitsCmd {
    /// Determine if the command is valid.
    ///
    /// Rejects commands carrying NaN or infinite values anywhere, and
    /// relative factors above [`MAX_RELATIVE_FACTOR`]. Non-positive values
    /// are valid everywhere as the "leave controller default" marker.
    pub fn is_valid(&self) -> bool {
        match *self {
            SpeedLimitsCmd::SetJointServo {
                relative_velocity,
                relative_acceleration,
                acceleration_override,
            } => {
                relative_factor_ok(relative_velocity)
                    && relative_factor_ok(relative_acceleration)
                    && relative_factor_ok(acceleration_override)
            }
            SpeedLimitsCmd::SetPtpJoint {
                relative_velocity,
                relative_acceleration,
            } => {
                relative_factor_ok(relative_velocity)
                    && relative_factor_ok(relative_acceleration)
            }
            SpeedLimitsCmd::SetPtpCartesian {
                cart_velocity_ms,
                orientation_velocity_rads,
                cart_acceleration_ms2,
                orientation_acceleration_rads2,
                cart_jerk_ms3,
                orientation_jerk_rads3,
            } => {
                cart_velocity_ms.is_finite()
                    && orientation_velocity_rads.is_finite()
                    && cart_acceleration_ms2.is_finite()
                    && orientation_acceleration_rads2.is_finite()
                    && cart_jerk_ms3.is_finite()
                    && orientation_jerk_rads3.is_finite()
            }
            SpeedLimitsCmd::SetCartesianServo {
                trans_velocity_ms,
                rot_velocity_rads,
            } => trans_velocity_ms.is_finite() && rot_velocity_rads.is_finite(),
            SpeedLimitsCmd::SetOverrideReduction { factor } => relative_factor_ok(factor),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// True if the value is acceptable as a relative factor.
fn relative_factor_ok(value: f64) -> bool {
    value.is_finite() && value <= MAX_RELATIVE_FACTOR
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nominal_cmds_valid() {
        assert!(SpeedLimitsCmd::SetJointServo {
            relative_velocity: 0.5,
            relative_acceleration: 0.5,
            acceleration_override: 2.0,
        }
        .is_valid());

        assert!(SpeedLimitsCmd::SetPtpCartesian {
            cart_velocity_ms: 2.0,
            orientation_velocity_rads: 0.5,
            cart_acceleration_ms2: 0.2,
            orientation_acceleration_rads2: 0.1,
            cart_jerk_ms3: -1.0,
            orientation_jerk_rads3: -1.0,
        }
        .is_valid());

        assert!(SpeedLimitsCmd::SetOverrideReduction { factor: 0.8 }.is_valid());
    }

    #[test]
    fn test_non_positive_values_valid() {
        // Zero and below mean "leave controller default", they must pass
        assert!(SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: -2.0,
            relative_acceleration: 0.0,
        }
        .is_valid());

        assert!(SpeedLimitsCmd::SetCartesianServo {
            trans_velocity_ms: Vector3::new(-1.0, -1.0, -1.0),
            rot_velocity_rads: Vector3::new(0.0, 0.0, 0.0),
        }
        .is_valid());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(!SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: f64::NAN,
            relative_acceleration: 0.5,
        }
        .is_valid());

        assert!(!SpeedLimitsCmd::SetPtpCartesian {
            cart_velocity_ms: f64::INFINITY,
            orientation_velocity_rads: 0.5,
            cart_acceleration_ms2: 0.2,
            orientation_acceleration_rads2: 0.1,
            cart_jerk_ms3: -1.0,
            orientation_jerk_rads3: -1.0,
        }
        .is_valid());

        assert!(!SpeedLimitsCmd::SetCartesianServo {
            trans_velocity_ms: Vector3::new(1.0, f64::NEG_INFINITY, 1.0),
            rot_velocity_rads: Vector3::new(0.5, 0.5, 0.5),
        }
        .is_valid());

        assert!(!SpeedLimitsCmd::SetOverrideReduction { factor: f64::NAN }.is_valid());
    }

    #[test]
    fn test_excessive_relative_factor_rejected() {
        assert!(!SpeedLimitsCmd::SetJointServo {
            relative_velocity: 0.5,
            relative_acceleration: 0.5,
            acceleration_override: 10.5,
        }
        .is_valid());

        assert!(!SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: 11.0,
            relative_acceleration: 0.5,
        }
        .is_valid());

        // Exactly at the bound is accepted
        assert!(SpeedLimitsCmd::SetJointServo {
            relative_velocity: 1.0,
            relative_acceleration: 1.0,
            acceleration_override: MAX_RELATIVE_FACTOR,
        }
        .is_valid());
    }
}
