//! Application of stored limits to outgoing motion demands
//!
//! Each motion mode has an applicator which copies the relevant limit group
//! out of the store and writes every overriding value into the demand through
//! the demand's own mutators. A limit only counts as overriding when it is
//! strictly positive, non-positive values leave the controller default in
//! place. For the per axis vector limits the whole vector is applied if any
//! component is positive, components are never gated individually.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    motion::{
        CartesianServoMotion, JointServoMotion, MotionDems, PtpCartesianMotion, PtpJointMotion,
    },
    units::{translation_to_ctrl_units, translation_vector_to_ctrl_units},
};

use super::SpeedLimits;

// ---------------------------------------------------------------------------
// POLICY FUNCTIONS
// ---------------------------------------------------------------------------

/// Gate for a scalar limit: strictly positive values override the controller
/// default, anything else (zero, negative, NaN) does not.
fn scalar_override(value: f64) -> Option<f64> {
    if value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Gate for a per axis vector limit: if any component is strictly positive
/// the whole vector overrides the controller default. The components are
/// deliberately not gated individually, the vector is applied or skipped as
/// one unit.
fn vector_override(value: [f64; 3]) -> Option<[f64; 3]> {
    if value.iter().any(|&v| v > 0.0) {
        Some(value)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedLimits {
    /// Apply the joint servo limit settings to a joint servo motion demand.
    pub fn apply_to_joint_servo(&self, motion: &mut JointServoMotion) {
        let limits = self.joint_servo();

        if let Some(vel) = scalar_override(limits.relative_velocity) {
            motion.set_relative_velocity(vel);
        }
        if let Some(acc) = scalar_override(limits.relative_acceleration) {
            motion.set_relative_acceleration(acc);
        }
        if let Some(ovr) = scalar_override(limits.acceleration_override) {
            motion.set_acceleration_override(ovr);
        }
    }

    /// Apply the point to point joint limit settings to a PTP joint motion
    /// demand.
    pub fn apply_to_ptp_joint(&self, motion: &mut PtpJointMotion) {
        let limits = self.ptp_joint();

        if let Some(vel) = scalar_override(limits.relative_velocity) {
            motion.set_relative_velocity(vel);
        }
        if let Some(acc) = scalar_override(limits.relative_acceleration) {
            motion.set_relative_acceleration(acc);
        }
    }

    /// Apply the point to point Cartesian limit settings to a PTP Cartesian
    /// motion demand.
    ///
    /// Translational values are converted into the controller's millimetre
    /// based units here, orientation values are already in the demand's
    /// native radian based units.
    pub fn apply_to_ptp_cartesian(&self, motion: &mut PtpCartesianMotion) {
        let limits = self.ptp_cartesian();

        if let Some(vel) = scalar_override(limits.cart_velocity_ms) {
            motion.set_cart_velocity(translation_to_ctrl_units(vel));
        }
        if let Some(vel) = scalar_override(limits.orientation_velocity_rads) {
            motion.set_orientation_velocity(vel);
        }
        if let Some(acc) = scalar_override(limits.cart_acceleration_ms2) {
            motion.set_cart_acceleration(translation_to_ctrl_units(acc));
        }
        if let Some(acc) = scalar_override(limits.orientation_acceleration_rads2) {
            motion.set_orientation_acceleration(acc);
        }
        if let Some(jerk) = scalar_override(limits.cart_jerk_ms3) {
            motion.set_cart_jerk(translation_to_ctrl_units(jerk));
        }
        if let Some(jerk) = scalar_override(limits.orientation_jerk_rads3) {
            motion.set_orientation_jerk(jerk);
        }
    }

    /// Apply the Cartesian servo limit settings to a Cartesian servo motion
    /// demand.
    pub fn apply_to_cartesian_servo(&self, motion: &mut CartesianServoMotion) {
        let limits = self.cartesian_servo();

        if let Some(vel) = vector_override(limits.trans_velocity_ms) {
            motion.set_trans_velocity(translation_vector_to_ctrl_units(vel));
        }
        if let Some(vel) = vector_override(limits.rot_velocity_rads) {
            motion.set_rot_velocity(vel);
        }
    }

    /// Apply the stored limit settings to an outgoing motion demand.
    ///
    /// Called once per demand, immediately before the demand is sent to the
    /// motion exec.
    pub fn apply(&self, dems: &mut MotionDems) {
        match dems {
            MotionDems::JointServo(m) => self.apply_to_joint_servo(m),
            MotionDems::PtpJoint(m) => self.apply_to_ptp_joint(m),
            MotionDems::PtpCartesian(m) => self.apply_to_ptp_cartesian(m),
            MotionDems::CartesianServo(m) => self.apply_to_cartesian_servo(m),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::PtpCartesianLimits;
    use super::*;
    use comms_if::{
        eqpt::motion::{Pose, NUM_JOINTS},
        tc::Vector3,
    };

    #[test]
    fn test_scalar_override_policy() {
        assert_eq!(scalar_override(0.5), Some(0.5));
        assert_eq!(scalar_override(10.0), Some(10.0));
        assert_eq!(scalar_override(0.0), None);
        assert_eq!(scalar_override(-1.0), None);
        assert_eq!(scalar_override(f64::NAN), None);
    }

    #[test]
    fn test_vector_override_policy() {
        // All positive applies
        assert_eq!(
            vector_override([1.0, 2.0, 3.0]),
            Some([1.0, 2.0, 3.0])
        );

        // A single positive component applies the whole vector, zeros
        // included
        assert_eq!(
            vector_override([0.0, 0.0, 0.3]),
            Some([0.0, 0.0, 0.3])
        );
        assert_eq!(
            vector_override([-1.0, 0.5, -2.0]),
            Some([-1.0, 0.5, -2.0])
        );

        // No positive component does not apply
        assert_eq!(vector_override([0.0, 0.0, 0.0]), None);
        assert_eq!(vector_override([-1.0, -2.0, -3.0]), None);
    }

    #[test]
    fn test_apply_joint_servo() {
        let limits = SpeedLimits::default();
        limits.set_joint_servo_limits(0.5, 1.0, 1.0);

        let mut motion = JointServoMotion::new([0.0; NUM_JOINTS]);
        limits.apply_to_joint_servo(&mut motion);

        assert_eq!(motion.relative_velocity(), Some(0.5));
        assert_eq!(motion.relative_acceleration(), Some(1.0));
        assert_eq!(motion.acceleration_override(), Some(1.0));
    }

    #[test]
    fn test_joint_servo_fields_gated_independently() {
        let limits = SpeedLimits::default();
        limits.set_joint_servo_limits(0.5, -1.0, 2.0);

        let mut motion = JointServoMotion::new([0.0; NUM_JOINTS]);
        limits.apply_to_joint_servo(&mut motion);

        assert_eq!(motion.relative_velocity(), Some(0.5));
        assert_eq!(motion.relative_acceleration(), None);
        assert_eq!(motion.acceleration_override(), Some(2.0));
    }

    #[test]
    fn test_ptp_joint_sentinel_skips_mutator() {
        let limits = SpeedLimits::default();
        limits.set_ptp_joint_limits(-2.0, 1.0);

        let mut motion = PtpJointMotion::new([0.0; NUM_JOINTS]);
        limits.apply_to_ptp_joint(&mut motion);

        assert_eq!(motion.relative_velocity(), None);
        assert_eq!(motion.relative_acceleration(), Some(1.0));
    }

    #[test]
    fn test_ptp_cartesian_converts_translation() {
        let limits = SpeedLimits::default();
        limits.set_ptp_cartesian_limits(PtpCartesianLimits {
            cart_velocity_ms: 2.0,
            ..Default::default()
        });

        let mut motion = PtpCartesianMotion::new(Pose::default());
        limits.apply_to_ptp_cartesian(&mut motion);

        // Translational values reach the demand in millimetre units,
        // orientation values pass through unchanged
        assert_eq!(motion.cart_velocity_mms(), Some(2000.0));
        assert_eq!(motion.orientation_velocity_rads(), Some(0.5));
        assert_eq!(motion.cart_acceleration_mms2(), Some(200.0));
        assert_eq!(motion.orientation_acceleration_rads2(), Some(0.1));

        // Default jerk limits are the disable sentinel, so the jerk mutators
        // are never invoked
        assert_eq!(motion.cart_jerk_mms3(), None);
        assert_eq!(motion.orientation_jerk_rads3(), None);
    }

    #[test]
    fn test_ptp_cartesian_jerk_override_applied() {
        let limits = SpeedLimits::default();
        limits.set_ptp_cartesian_limits(PtpCartesianLimits {
            cart_jerk_ms3: 0.05,
            orientation_jerk_rads3: 0.02,
            ..Default::default()
        });

        let mut motion = PtpCartesianMotion::new(Pose::default());
        limits.apply_to_ptp_cartesian(&mut motion);

        // A positive jerk limit reaches the demand, millimetre converted for
        // the translational field and as-is for the orientation field
        assert_eq!(motion.cart_jerk_mms3(), Some(50.0));
        assert_eq!(motion.orientation_jerk_rads3(), Some(0.02));
    }

    #[test]
    fn test_cartesian_servo_vector_group_gate() {
        let limits = SpeedLimits::default();
        limits.set_cartesian_servo_limits(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.3),
        );

        let mut motion = CartesianServoMotion::new(Pose::default());
        limits.apply_to_cartesian_servo(&mut motion);

        // Translational group is all non-positive so it stays unset, the
        // rotational group has one positive component so the full triple is
        // written
        assert_eq!(motion.trans_velocity_mms(), None);
        assert_eq!(motion.rot_velocity_rads(), Some([0.0, 0.0, 0.3]));
    }

    #[test]
    fn test_cartesian_servo_rotational_routed_to_rotational_mutator() {
        // The rotational group must land on the rotational mutator with no
        // millimetre conversion. An earlier revision wrote it through the
        // translational mutator, which this test guards against.
        let limits = SpeedLimits::default();
        limits.set_cartesian_servo_limits(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
        );

        let mut motion = CartesianServoMotion::new(Pose::default());
        limits.apply_to_cartesian_servo(&mut motion);

        assert_eq!(motion.trans_velocity_mms(), Some([1000.0, 2000.0, 3000.0]));
        assert_eq!(motion.rot_velocity_rads(), Some([4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_no_mixed_vector_writes_reach_demands() {
        use std::sync::Arc;
        use std::thread;

        let limits = Arc::new(SpeedLimits::default());

        // A writer thread alternates the rotational group between two uniform
        // triples while this thread applies the limits to fresh demands. Each
        // demand must carry one triple or the other in full, never components
        // from both writes.
        let writer = {
            let limits = Arc::clone(&limits);
            thread::spawn(move || {
                for i in 0..1000 {
                    let v = if i % 2 == 0 { 0.2 } else { 0.4 };
                    limits.set_cartesian_servo_limits(
                        Vector3::new(1.0, 1.0, 1.0),
                        Vector3::new(v, v, v),
                    );
                }
            })
        };

        for _ in 0..1000 {
            let mut motion = CartesianServoMotion::new(Pose::default());
            limits.apply_to_cartesian_servo(&mut motion);

            let rot = motion.rot_velocity_rads().unwrap();
            assert!(
                rot == [0.2; 3] || rot == [0.4; 3] || rot == [0.5; 3],
                "demand built from a torn vector read: {:?}",
                rot
            );
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_apply_dispatches_by_mode() {
        let limits = SpeedLimits::default();
        limits.set_ptp_joint_limits(0.25, -1.0);

        let mut dems = MotionDems::PtpJoint(PtpJointMotion::new([0.0; NUM_JOINTS]));
        limits.apply(&mut dems);

        match dems {
            MotionDems::PtpJoint(m) => {
                assert_eq!(m.relative_velocity(), Some(0.25));
                assert_eq!(m.relative_acceleration(), None);
            }
            _ => panic!("demand changed mode"),
        }
    }

    #[test]
    fn test_override_reduction_not_applied_to_demands() {
        // The override reduction factor is stored and reported but no
        // applicator consumes it, a reduced factor must leave demands
        // untouched.
        let limits = SpeedLimits::default();
        limits.set_override_reduction(0.1);

        let mut motion = JointServoMotion::new([0.0; NUM_JOINTS]);
        limits.apply_to_joint_servo(&mut motion);

        assert_eq!(motion.relative_velocity(), Some(1.0));
        assert_eq!(motion.relative_acceleration(), Some(1.0));
        assert_eq!(motion.acceleration_override(), Some(1.0));
    }
}
