//! # Motion telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use super::{Quaternion, Vector3};
use crate::eqpt::motion::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A motion that can be commanded of the manipulator.
///
/// Point-to-point motions are issued to the motion controller once on
/// arrival. Servo motions are streamed: each command refreshes the stream
/// target, and the executive keeps issuing the target until the stream goes
/// stale or a [`MotionCmd::Stop`] arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum MotionCmd {
    /// A continuous joint-space servo target.
    #[structopt(name = "joint-servo")]
    JointServo {
        /// Target position for each joint, base first.
        ///
        /// Units: radians
        target_pos_rad: Vec<f64>,
    },

    /// A point-to-point joint motion.
    #[structopt(name = "ptp-joint")]
    PtpJoint {
        /// Target position for each joint, base first.
        ///
        /// Units: radians
        target_pos_rad: Vec<f64>,
    },

    /// A point-to-point Cartesian motion of the end effector.
    #[structopt(name = "ptp-cart")]
    PtpCartesian {
        /// Target end effector position, written as `x,y,z`.
        ///
        /// Units: meters
        position_m: Vector3,

        /// Target end effector attitude, written as `w,x,y,z`.
        attitude_q: Quaternion,
    },

    /// A continuous Cartesian servo target for the end effector.
    #[structopt(name = "cart-servo")]
    CartesianServo {
        /// Target end effector position, written as `x,y,z`.
        ///
        /// Units: meters
        position_m: Vector3,

        /// Target end effector attitude, written as `w,x,y,z`.
        attitude_q: Quaternion,
    },

    /// Stop the manipulator, clearing any active motion.
    #[structopt(name = "stop")]
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionCmd {
    /// True if the command carries a full, finite set of targets.
    pub fn is_valid(&self) -> bool {
        match self {
            MotionCmd::JointServo { target_pos_rad } | MotionCmd::PtpJoint { target_pos_rad } => {
                target_pos_rad.len() == NUM_JOINTS
                    && target_pos_rad.iter().all(|p| p.is_finite())
            }
            MotionCmd::PtpCartesian {
                position_m,
                attitude_q,
            }
            | MotionCmd::CartesianServo {
                position_m,
                attitude_q,
            } => position_m.is_finite() && attitude_q.is_finite() && attitude_q.norm() > 0.0,
            MotionCmd::Stop => true,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_cmd_validity() {
        assert!(MotionCmd::PtpJoint {
            target_pos_rad: vec![0.0; NUM_JOINTS],
        }
        .is_valid());

        // Wrong joint count
        assert!(!MotionCmd::PtpJoint {
            target_pos_rad: vec![0.0; NUM_JOINTS - 1],
        }
        .is_valid());

        // Non-finite target
        let mut target = vec![0.0; NUM_JOINTS];
        target[3] = f64::NAN;
        assert!(!MotionCmd::JointServo {
            target_pos_rad: target,
        }
        .is_valid());
    }

    #[test]
    fn test_cartesian_cmd_validity() {
        let valid = MotionCmd::PtpCartesian {
            position_m: Vector3::new(0.4, 0.0, 0.6),
            attitude_q: Quaternion {
                w: 1.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        };
        assert!(valid.is_valid());

        // A zero quaternion cannot describe an attitude
        assert!(!MotionCmd::CartesianServo {
            position_m: Vector3::new(0.4, 0.0, 0.6),
            attitude_q: Quaternion {
                w: 0.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        }
        .is_valid());
    }

    #[test]
    fn test_stop_always_valid() {
        assert!(MotionCmd::Stop.is_valid());
    }
}
