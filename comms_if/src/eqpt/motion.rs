//! # Motion Controller Equipment Commands
//!
//! Motion demands are built by the executive and sent to the motion
//! controller server. Each demand carries the motion target together with
//! optional limit overrides. A limit field of `None` means no override was
//! configured for that field and the controller's own default applies, so no
//! in-band marker value ever crosses this interface.
//!
//! Limit fields can only be written through their setter, which keeps the
//! point of application in one place. Translational Cartesian limits are in
//! the controller's native millimetre-based units; the setters expect values
//! already converted through [`crate::eqpt::units`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the manipulator.
pub const NUM_JOINTS: usize = 7;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose of the end effector.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position of the end effector.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude of the end effector as a quaternion, scalar first.
    pub attitude_q: [f64; 4],
}

/// A continuous joint-space servo demand.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointServoMotion {
    /// Target position for each joint.
    ///
    /// Units: radians
    pub target_pos_rad: [f64; NUM_JOINTS],

    relative_velocity: Option<f64>,
    relative_acceleration: Option<f64>,
    acceleration_override: Option<f64>,
}

/// A point-to-point joint motion demand.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PtpJointMotion {
    /// Target position for each joint.
    ///
    /// Units: radians
    pub target_pos_rad: [f64; NUM_JOINTS],

    relative_velocity: Option<f64>,
    relative_acceleration: Option<f64>,
}

/// A point-to-point Cartesian motion demand.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PtpCartesianMotion {
    /// Target pose of the end effector.
    pub target_pose: Pose,

    cart_velocity_mms: Option<f64>,
    orientation_velocity_rads: Option<f64>,
    cart_acceleration_mms2: Option<f64>,
    orientation_acceleration_rads2: Option<f64>,
    cart_jerk_mms3: Option<f64>,
    orientation_jerk_rads3: Option<f64>,
}

/// A continuous Cartesian servo demand.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CartesianServoMotion {
    /// Target pose of the end effector.
    pub target_pose: Pose,

    trans_velocity_mms: Option<[f64; 3]>,
    rot_velocity_rads: Option<[f64; 3]>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from the motion client to the motion server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum MotionDems {
    JointServo(JointServoMotion),
    PtpJoint(PtpJointMotion),
    PtpCartesian(PtpCartesianMotion),
    CartesianServo(CartesianServoMotion),
}

/// Response from the motion server based on the demands sent by the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionDemsResponse {
    /// The demands passed validation and will be actuated
    DemsOk,

    /// The demands failed validation and were dropped
    DemsInvalid,

    /// Controller is invalid so demands cannot be actuated
    CtrlInvalid,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: [0.0; 3],
            attitude_q: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl JointServoMotion {
    /// Create a new demand for the given target, with no limit overrides.
    pub fn new(target_pos_rad: [f64; NUM_JOINTS]) -> Self {
        Self {
            target_pos_rad,
            relative_velocity: None,
            relative_acceleration: None,
            acceleration_override: None,
        }
    }

    /// Override the relative joint velocity limit (dimensionless).
    pub fn set_relative_velocity(&mut self, factor: f64) {
        self.relative_velocity = Some(factor);
    }

    /// Override the relative joint acceleration limit (dimensionless).
    pub fn set_relative_acceleration(&mut self, factor: f64) {
        self.relative_acceleration = Some(factor);
    }

    /// Override the controller's acceleration override factor (dimensionless).
    pub fn set_acceleration_override(&mut self, factor: f64) {
        self.acceleration_override = Some(factor);
    }

    pub fn relative_velocity(&self) -> Option<f64> {
        self.relative_velocity
    }

    pub fn relative_acceleration(&self) -> Option<f64> {
        self.relative_acceleration
    }

    pub fn acceleration_override(&self) -> Option<f64> {
        self.acceleration_override
    }
}

impl PtpJointMotion {
    /// Create a new demand for the given target, with no limit overrides.
    pub fn new(target_pos_rad: [f64; NUM_JOINTS]) -> Self {
        Self {
            target_pos_rad,
            relative_velocity: None,
            relative_acceleration: None,
        }
    }

    /// Override the relative joint velocity limit (dimensionless).
    pub fn set_relative_velocity(&mut self, factor: f64) {
        self.relative_velocity = Some(factor);
    }

    /// Override the relative joint acceleration limit (dimensionless).
    pub fn set_relative_acceleration(&mut self, factor: f64) {
        self.relative_acceleration = Some(factor);
    }

    pub fn relative_velocity(&self) -> Option<f64> {
        self.relative_velocity
    }

    pub fn relative_acceleration(&self) -> Option<f64> {
        self.relative_acceleration
    }
}

impl PtpCartesianMotion {
    /// Create a new demand for the given target, with no limit overrides.
    pub fn new(target_pose: Pose) -> Self {
        Self {
            target_pose,
            cart_velocity_mms: None,
            orientation_velocity_rads: None,
            cart_acceleration_mms2: None,
            orientation_acceleration_rads2: None,
            cart_jerk_mms3: None,
            orientation_jerk_rads3: None,
        }
    }

    /// Override the translational velocity limit.
    ///
    /// Units: millimeters/second (controller native)
    pub fn set_cart_velocity(&mut self, vel_mms: f64) {
        self.cart_velocity_mms = Some(vel_mms);
    }

    /// Override the orientation velocity limit.
    ///
    /// Units: radians/second
    pub fn set_orientation_velocity(&mut self, vel_rads: f64) {
        self.orientation_velocity_rads = Some(vel_rads);
    }

    /// Override the translational acceleration limit.
    ///
    /// Units: millimeters/second^2 (controller native)
    pub fn set_cart_acceleration(&mut self, acc_mms2: f64) {
        self.cart_acceleration_mms2 = Some(acc_mms2);
    }

    /// Override the orientation acceleration limit.
    ///
    /// Units: radians/second^2
    pub fn set_orientation_acceleration(&mut self, acc_rads2: f64) {
        self.orientation_acceleration_rads2 = Some(acc_rads2);
    }

    /// Override the translational jerk limit.
    ///
    /// Units: millimeters/second^3 (controller native)
    pub fn set_cart_jerk(&mut self, jerk_mms3: f64) {
        self.cart_jerk_mms3 = Some(jerk_mms3);
    }

    /// Override the orientation jerk limit.
    ///
    /// Units: radians/second^3
    pub fn set_orientation_jerk(&mut self, jerk_rads3: f64) {
        self.orientation_jerk_rads3 = Some(jerk_rads3);
    }

    pub fn cart_velocity_mms(&self) -> Option<f64> {
        self.cart_velocity_mms
    }

    pub fn orientation_velocity_rads(&self) -> Option<f64> {
        self.orientation_velocity_rads
    }

    pub fn cart_acceleration_mms2(&self) -> Option<f64> {
        self.cart_acceleration_mms2
    }

    pub fn orientation_acceleration_rads2(&self) -> Option<f64> {
        self.orientation_acceleration_rads2
    }

    pub fn cart_jerk_mms3(&self) -> Option<f64> {
        self.cart_jerk_mms3
    }

    pub fn orientation_jerk_rads3(&self) -> Option<f64> {
        self.orientation_jerk_rads3
    }
}

impl MotionDems {
    /// Determine if the demand can be actuated.
    ///
    /// Checks that every target is finite, that Cartesian attitudes are
    /// usable, and that any limit override carries a usable value. Scalar
    /// overrides must be positive. Vector overrides are applied as a unit and
    /// may carry non-positive components alongside positive ones, so only
    /// finiteness is required of them.
    pub fn is_valid(&self) -> bool {
        match self {
            MotionDems::JointServo(m) => {
                m.target_pos_rad.iter().all(|p| p.is_finite())
                    && scalar_override_ok(m.relative_velocity)
                    && scalar_override_ok(m.relative_acceleration)
                    && scalar_override_ok(m.acceleration_override)
            }
            MotionDems::PtpJoint(m) => {
                m.target_pos_rad.iter().all(|p| p.is_finite())
                    && scalar_override_ok(m.relative_velocity)
                    && scalar_override_ok(m.relative_acceleration)
            }
            MotionDems::PtpCartesian(m) => {
                pose_ok(&m.target_pose)
                    && scalar_override_ok(m.cart_velocity_mms)
                    && scalar_override_ok(m.orientation_velocity_rads)
                    && scalar_override_ok(m.cart_acceleration_mms2)
                    && scalar_override_ok(m.orientation_acceleration_rads2)
                    && scalar_override_ok(m.cart_jerk_mms3)
                    && scalar_override_ok(m.orientation_jerk_rads3)
            }
            MotionDems::CartesianServo(m) => {
                pose_ok(&m.target_pose)
                    && vector_override_ok(m.trans_velocity_mms)
                    && vector_override_ok(m.rot_velocity_rads)
            }
        }
    }
}

impl CartesianServoMotion {
    /// Create a new demand for the given target, with no limit overrides.
    pub fn new(target_pose: Pose) -> Self {
        Self {
            target_pose,
            trans_velocity_mms: None,
            rot_velocity_rads: None,
        }
    }

    /// Override the per-axis translational velocity limit.
    ///
    /// Units: millimeters/second (controller native)
    pub fn set_trans_velocity(&mut self, vel_mms: [f64; 3]) {
        self.trans_velocity_mms = Some(vel_mms);
    }

    /// Override the per-axis rotational velocity limit.
    ///
    /// Units: radians/second
    pub fn set_rot_velocity(&mut self, vel_rads: [f64; 3]) {
        self.rot_velocity_rads = Some(vel_rads);
    }

    pub fn trans_velocity_mms(&self) -> Option<[f64; 3]> {
        self.trans_velocity_mms
    }

    pub fn rot_velocity_rads(&self) -> Option<[f64; 3]> {
        self.rot_velocity_rads
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// True if the optional scalar override is absent or carries a positive finite
/// value.
fn scalar_override_ok(value: Option<f64>) -> bool {
    match value {
        Some(v) => v.is_finite() && v > 0.0,
        None => true,
    }
}

/// True if the optional vector override is absent or finite in every
/// component.
fn vector_override_ok(value: Option<[f64; 3]>) -> bool {
    match value {
        Some(v) => v.iter().all(|c| c.is_finite()),
        None => true,
    }
}

/// True if the pose target is usable.
fn pose_ok(pose: &Pose) -> bool {
    let norm_sq: f64 = pose.attitude_q.iter().map(|c| c * c).sum();

    pose.position_m.iter().all(|c| c.is_finite()) && norm_sq.is_finite() && norm_sq > 0.0
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_demands_carry_no_overrides() {
        let joint_servo = JointServoMotion::new([0.0; NUM_JOINTS]);
        assert_eq!(joint_servo.relative_velocity(), None);
        assert_eq!(joint_servo.relative_acceleration(), None);
        assert_eq!(joint_servo.acceleration_override(), None);

        let ptp_cart = PtpCartesianMotion::new(Pose::default());
        assert_eq!(ptp_cart.cart_velocity_mms(), None);
        assert_eq!(ptp_cart.orientation_jerk_rads3(), None);

        let cart_servo = CartesianServoMotion::new(Pose::default());
        assert_eq!(cart_servo.trans_velocity_mms(), None);
        assert_eq!(cart_servo.rot_velocity_rads(), None);
    }

    #[test]
    fn test_dems_json_round_trip() {
        let mut motion = PtpCartesianMotion::new(Pose::default());
        motion.set_cart_velocity(2000.0);
        motion.set_orientation_velocity(0.5);

        let dems = MotionDems::PtpCartesian(motion);
        let json = serde_json::to_string(&dems).unwrap();
        let parsed: MotionDems = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, dems);
    }

    #[test]
    fn test_nominal_dems_valid() {
        let mut joint_servo = JointServoMotion::new([0.2; NUM_JOINTS]);
        joint_servo.set_relative_velocity(0.5);
        assert!(MotionDems::JointServo(joint_servo).is_valid());

        let mut ptp_cart = PtpCartesianMotion::new(Pose::default());
        ptp_cart.set_cart_velocity(2000.0);
        ptp_cart.set_cart_acceleration(200.0);
        assert!(MotionDems::PtpCartesian(ptp_cart).is_valid());
    }

    #[test]
    fn test_non_finite_target_invalid() {
        let mut target = [0.0; NUM_JOINTS];
        target[2] = f64::NAN;
        assert!(!MotionDems::PtpJoint(PtpJointMotion::new(target)).is_valid());

        let pose = Pose {
            position_m: [f64::INFINITY, 0.0, 0.0],
            ..Default::default()
        };
        assert!(!MotionDems::PtpCartesian(PtpCartesianMotion::new(pose)).is_valid());
    }

    #[test]
    fn test_zero_attitude_invalid() {
        let pose = Pose {
            position_m: [0.4, 0.0, 0.6],
            attitude_q: [0.0; 4],
        };
        assert!(!MotionDems::CartesianServo(CartesianServoMotion::new(pose)).is_valid());
    }

    #[test]
    fn test_non_positive_scalar_override_invalid() {
        let mut motion = PtpJointMotion::new([0.0; NUM_JOINTS]);
        motion.set_relative_velocity(0.0);
        assert!(!MotionDems::PtpJoint(motion).is_valid());
    }

    #[test]
    fn test_vector_override_may_carry_zero_components() {
        // Vector limits are applied as a unit, a zero component alongside a
        // positive one is a legitimate demand
        let mut motion = CartesianServoMotion::new(Pose::default());
        motion.set_rot_velocity([0.0, 0.0, 0.3]);
        assert!(MotionDems::CartesianServo(motion).is_valid());

        let mut motion = CartesianServoMotion::new(Pose::default());
        motion.set_trans_velocity([1000.0, f64::NAN, 0.0]);
        assert!(!MotionDems::CartesianServo(motion).is_valid());
    }
}
