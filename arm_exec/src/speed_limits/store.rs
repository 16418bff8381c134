//! Implementation of the speed limit store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

// Internal
use super::SpeedLimitsParams;
use comms_if::tc::Vector3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Store of the limit settings applied to outgoing motion demands.
///
/// Settings are grouped by motion mode, and each group is read and written as
/// a whole so that a reader can never observe a half written group. Values are
/// stored exactly as commanded, including the non-positive sentinel values
/// that mean "leave the controller default in place".
pub struct SpeedLimits {
    joint_servo: RwLock<JointServoLimits>,
    ptp_joint: RwLock<PtpJointLimits>,
    ptp_cartesian: RwLock<PtpCartesianLimits>,
    cartesian_servo: RwLock<CartesianServoLimits>,
    override_reduction: RwLock<f64>,
}

/// Limit settings for joint servo motions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointServoLimits {
    /// Relative velocity factor, as a fraction of the controller maximum.
    pub relative_velocity: f64,

    /// Relative acceleration factor, as a fraction of the controller maximum.
    pub relative_acceleration: f64,

    /// Acceleration override factor, in the range (0, 10].
    pub acceleration_override: f64,
}

/// Limit settings for point to point joint motions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtpJointLimits {
    /// Relative velocity factor, as a fraction of the controller maximum.
    pub relative_velocity: f64,

    /// Relative acceleration factor, as a fraction of the controller maximum.
    pub relative_acceleration: f64,
}

/// Limit settings for point to point Cartesian motions.
///
/// Translational values are stored in metre based units and are only converted
/// to the controller's native millimetre based units when written into a
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtpCartesianLimits {
    /// Cartesian velocity limit.
    ///
    /// Units: meters/second
    pub cart_velocity_ms: f64,

    /// Orientation velocity limit.
    ///
    /// Units: radians/second
    pub orientation_velocity_rads: f64,

    /// Cartesian acceleration limit.
    ///
    /// Units: meters/second^2
    pub cart_acceleration_ms2: f64,

    /// Orientation acceleration limit.
    ///
    /// Units: radians/second^2
    pub orientation_acceleration_rads2: f64,

    /// Cartesian jerk limit.
    ///
    /// Units: meters/second^3
    pub cart_jerk_ms3: f64,

    /// Orientation jerk limit.
    ///
    /// Units: radians/second^3
    pub orientation_jerk_rads3: f64,
}

/// Limit settings for Cartesian servo motions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianServoLimits {
    /// Per axis translational velocity limits.
    ///
    /// Units: meters/second
    pub trans_velocity_ms: [f64; 3],

    /// Per axis rotational velocity limits.
    ///
    /// Units: radians/second
    pub rot_velocity_rads: [f64; 3],
}

/// A consistent copy of every group in the store, suitable for saving into
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimitsSnapshot {
    pub joint_servo: JointServoLimits,
    pub ptp_joint: PtpJointLimits,
    pub ptp_cartesian: PtpCartesianLimits,
    pub cartesian_servo: CartesianServoLimits,
    pub override_reduction: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for JointServoLimits {
    fn default() -> Self {
        Self {
            relative_velocity: 1.0,
            relative_acceleration: 1.0,
            acceleration_override: 1.0,
        }
    }
}

impl Default for PtpJointLimits {
    fn default() -> Self {
        Self {
            relative_velocity: 1.0,
            relative_acceleration: 1.0,
        }
    }
}

impl Default for PtpCartesianLimits {
    fn default() -> Self {
        Self {
            cart_velocity_ms: 1.0,
            orientation_velocity_rads: 0.5,
            cart_acceleration_ms2: 0.2,
            orientation_acceleration_rads2: 0.1,
            // Jerk limits default to the sentinel, leaving the controller's
            // own jerk planning untouched.
            cart_jerk_ms3: -1.0,
            orientation_jerk_rads3: -1.0,
        }
    }
}

impl Default for CartesianServoLimits {
    fn default() -> Self {
        Self {
            trans_velocity_ms: [1.0; 3],
            rot_velocity_rads: [0.5; 3],
        }
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            joint_servo: RwLock::new(JointServoLimits::default()),
            ptp_joint: RwLock::new(PtpJointLimits::default()),
            ptp_cartesian: RwLock::new(PtpCartesianLimits::default()),
            cartesian_servo: RwLock::new(CartesianServoLimits::default()),
            override_reduction: RwLock::new(1.0),
        }
    }
}

impl SpeedLimits {
    /// Create a new store seeded from the given parameters.
    ///
    /// The joint servo group takes its initial relative factors from the
    /// parameters, every other setting starts at its built in default.
    pub fn new(params: &SpeedLimitsParams) -> Self {
        let joint_servo = JointServoLimits {
            relative_velocity: params.joint_servo_relative_velocity,
            relative_acceleration: params.joint_servo_relative_acceleration,
            ..Default::default()
        };

        Self {
            joint_servo: RwLock::new(joint_servo),
            ..Default::default()
        }
    }

    // ---- SETTERS ----

    /// Set the limit settings for joint servo motions.
    pub fn set_joint_servo_limits(
        &self,
        relative_velocity: f64,
        relative_acceleration: f64,
        acceleration_override: f64,
    ) {
        let mut group = self
            .joint_servo
            .write()
            .expect("SpeedLimits: joint_servo lock poisoned");

        *group = JointServoLimits {
            relative_velocity,
            relative_acceleration,
            acceleration_override,
        };
    }

    /// Set the limit settings for point to point joint motions.
    pub fn set_ptp_joint_limits(&self, relative_velocity: f64, relative_acceleration: f64) {
        let mut group = self
            .ptp_joint
            .write()
            .expect("SpeedLimits: ptp_joint lock poisoned");

        *group = PtpJointLimits {
            relative_velocity,
            relative_acceleration,
        };
    }

    /// Set the limit settings for point to point Cartesian motions.
    pub fn set_ptp_cartesian_limits(&self, limits: PtpCartesianLimits) {
        let mut group = self
            .ptp_cartesian
            .write()
            .expect("SpeedLimits: ptp_cartesian lock poisoned");

        *group = limits;
    }

    /// Set the limit settings for Cartesian servo motions.
    pub fn set_cartesian_servo_limits(
        &self,
        trans_velocity_ms: Vector3,
        rot_velocity_rads: Vector3,
    ) {
        let mut group = self
            .cartesian_servo
            .write()
            .expect("SpeedLimits: cartesian_servo lock poisoned");

        *group = CartesianServoLimits {
            trans_velocity_ms: trans_velocity_ms.into(),
            rot_velocity_rads: rot_velocity_rads.into(),
        };
    }

    /// Set the override reduction factor.
    pub fn set_override_reduction(&self, factor: f64) {
        let mut value = self
            .override_reduction
            .write()
            .expect("SpeedLimits: override_reduction lock poisoned");

        *value = factor;
    }

    // ---- GETTERS ----

    /// Get a copy of the joint servo limit settings.
    pub fn joint_servo(&self) -> JointServoLimits {
        *self
            .joint_servo
            .read()
            .expect("SpeedLimits: joint_servo lock poisoned")
    }

    /// Get a copy of the point to point joint limit settings.
    pub fn ptp_joint(&self) -> PtpJointLimits {
        *self
            .ptp_joint
            .read()
            .expect("SpeedLimits: ptp_joint lock poisoned")
    }

    /// Get a copy of the point to point Cartesian limit settings.
    pub fn ptp_cartesian(&self) -> PtpCartesianLimits {
        *self
            .ptp_cartesian
            .read()
            .expect("SpeedLimits: ptp_cartesian lock poisoned")
    }

    /// Get a copy of the Cartesian servo limit settings.
    pub fn cartesian_servo(&self) -> CartesianServoLimits {
        *self
            .cartesian_servo
            .read()
            .expect("SpeedLimits: cartesian_servo lock poisoned")
    }

    /// Get the override reduction factor.
    pub fn override_reduction(&self) -> f64 {
        *self
            .override_reduction
            .read()
            .expect("SpeedLimits: override_reduction lock poisoned")
    }

    /// Take a copy of every group in the store.
    pub fn snapshot(&self) -> SpeedLimitsSnapshot {
        SpeedLimitsSnapshot {
            joint_servo: self.joint_servo(),
            ptp_joint: self.ptp_joint(),
            ptp_cartesian: self.ptp_cartesian(),
            cartesian_servo: self.cartesian_servo(),
            override_reduction: self.override_reduction(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = SpeedLimits::default();

        let js = limits.joint_servo();
        assert_eq!(js.relative_velocity, 1.0);
        assert_eq!(js.relative_acceleration, 1.0);
        assert_eq!(js.acceleration_override, 1.0);

        let pj = limits.ptp_joint();
        assert_eq!(pj.relative_velocity, 1.0);
        assert_eq!(pj.relative_acceleration, 1.0);

        let pc = limits.ptp_cartesian();
        assert_eq!(pc.cart_velocity_ms, 1.0);
        assert_eq!(pc.orientation_velocity_rads, 0.5);
        assert_eq!(pc.cart_acceleration_ms2, 0.2);
        assert_eq!(pc.orientation_acceleration_rads2, 0.1);
        assert_eq!(pc.cart_jerk_ms3, -1.0);
        assert_eq!(pc.orientation_jerk_rads3, -1.0);

        let cs = limits.cartesian_servo();
        assert_eq!(cs.trans_velocity_ms, [1.0; 3]);
        assert_eq!(cs.rot_velocity_rads, [0.5; 3]);

        assert_eq!(limits.override_reduction(), 1.0);
    }

    #[test]
    fn test_new_seeds_joint_servo() {
        let params = SpeedLimitsParams {
            joint_servo_relative_velocity: 0.3,
            joint_servo_relative_acceleration: 0.4,
        };

        let limits = SpeedLimits::new(&params);

        let js = limits.joint_servo();
        assert_eq!(js.relative_velocity, 0.3);
        assert_eq!(js.relative_acceleration, 0.4);
        assert_eq!(js.acceleration_override, 1.0);

        // Other groups keep their defaults
        assert_eq!(limits.ptp_joint(), PtpJointLimits::default());
    }

    #[test]
    fn test_round_trip_exact() {
        let limits = SpeedLimits::default();

        // Sentinel values must survive a round trip unchanged
        limits.set_joint_servo_limits(0.5, -1.0, 0.0);
        let js = limits.joint_servo();
        assert_eq!(js.relative_velocity, 0.5);
        assert_eq!(js.relative_acceleration, -1.0);
        assert_eq!(js.acceleration_override, 0.0);

        limits.set_ptp_joint_limits(0.25, 0.75);
        let pj = limits.ptp_joint();
        assert_eq!(pj.relative_velocity, 0.25);
        assert_eq!(pj.relative_acceleration, 0.75);

        let set = PtpCartesianLimits {
            cart_velocity_ms: 2.0,
            orientation_velocity_rads: 1.0,
            cart_acceleration_ms2: -1.0,
            orientation_acceleration_rads2: 0.05,
            cart_jerk_ms3: 0.01,
            orientation_jerk_rads3: -1.0,
        };
        limits.set_ptp_cartesian_limits(set);
        assert_eq!(limits.ptp_cartesian(), set);

        limits.set_cartesian_servo_limits(
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(-1.0, 0.5, 0.6),
        );
        let cs = limits.cartesian_servo();
        assert_eq!(cs.trans_velocity_ms, [0.1, 0.2, 0.3]);
        assert_eq!(cs.rot_velocity_rads, [-1.0, 0.5, 0.6]);

        limits.set_override_reduction(0.8);
        assert_eq!(limits.override_reduction(), 0.8);
    }

    #[test]
    fn test_snapshot_matches_store() {
        let limits = SpeedLimits::default();
        limits.set_ptp_joint_limits(0.2, 0.3);
        limits.set_override_reduction(0.9);

        let snapshot = limits.snapshot();
        assert_eq!(snapshot.ptp_joint, limits.ptp_joint());
        assert_eq!(snapshot.joint_servo, limits.joint_servo());
        assert_eq!(snapshot.override_reduction, 0.9);
    }

    #[test]
    fn test_no_torn_group_reads() {
        use std::sync::Arc;
        use std::thread;

        let limits = Arc::new(SpeedLimits::default());

        // A writer thread alternates the joint servo group between two
        // uniform settings while this thread reads. Every read must come back
        // with all three fields equal, a mix would mean a torn read.
        let writer = {
            let limits = Arc::clone(&limits);
            thread::spawn(move || {
                for i in 0..1000 {
                    if i % 2 == 0 {
                        limits.set_joint_servo_limits(0.25, 0.25, 0.25);
                    } else {
                        limits.set_joint_servo_limits(0.75, 0.75, 0.75);
                    }
                }
            })
        };

        for _ in 0..1000 {
            let js = limits.joint_servo();
            assert!(
                js.relative_velocity == js.relative_acceleration
                    && js.relative_acceleration == js.acceleration_override
            );
        }

        writer.join().unwrap();
    }
}
