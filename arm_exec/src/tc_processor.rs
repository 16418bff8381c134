//! # Telecommand execution
//!
//! The telecommand processor executes TCs coming from any source, mutating
//! the datastore and returning the response to hand back to that source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use arm_lib::data_store::{DataStore, SafeModeCause};
use arm_lib::speed_limits::PtpCartesianLimits;
use comms_if::tc::{speed_limits::SpeedLimitsCmd, Tc, TcResponse};
use util::session;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a single telecommand against the data store.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) -> TcResponse {
    match tc {
        Tc::MakeSafe => {
            debug!("Received MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
            TcResponse::Ok
        }
        Tc::MakeUnsafe => {
            debug!("Received MakeUnsafe command");
            match ds.make_unsafe(SafeModeCause::MakeSafeTc) {
                Ok(()) => TcResponse::Ok,
                Err(()) => {
                    warn!("Cannot leave safe mode, another safe mode cause is active");
                    TcResponse::CannotExecute
                }
            }
        }
        Tc::SpeedLimits(cmd) => exec_speed_limits(ds, cmd),
        Tc::Motion(cmd) => {
            // Motion is refused while safe no matter which source sent it.
            // Limits reconfiguration stays available in safe mode.
            if ds.safe {
                warn!("Motion command refused while in safe mode");
                return TcResponse::CannotExecute;
            }

            if cmd.is_valid() {
                ds.motion_mgr_input.cmd = Some(cmd.clone());
                TcResponse::Ok
            } else {
                warn!("Received an invalid motion command: {:#?}", cmd);
                TcResponse::Invalid
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a speed limits reconfiguration command.
fn exec_speed_limits(ds: &mut DataStore, cmd: &SpeedLimitsCmd) -> TcResponse {
    if !cmd.is_valid() {
        warn!("Received an invalid speed limits command: {:#?}", cmd);
        return TcResponse::Invalid;
    }

    match *cmd {
        SpeedLimitsCmd::SetJointServo {
            relative_velocity,
            relative_acceleration,
            acceleration_override,
        } => {
            ds.speed_limits.set_joint_servo_limits(
                relative_velocity,
                relative_acceleration,
                acceleration_override,
            );
        }
        SpeedLimitsCmd::SetPtpJoint {
            relative_velocity,
            relative_acceleration,
        } => {
            ds.speed_limits
                .set_ptp_joint_limits(relative_velocity, relative_acceleration);
        }
        SpeedLimitsCmd::SetPtpCartesian {
            cart_velocity_ms,
            orientation_velocity_rads,
            cart_acceleration_ms2,
            orientation_acceleration_rads2,
            cart_jerk_ms3,
            orientation_jerk_rads3,
        } => {
            ds.speed_limits.set_ptp_cartesian_limits(PtpCartesianLimits {
                cart_velocity_ms,
                orientation_velocity_rads,
                cart_acceleration_ms2,
                orientation_acceleration_rads2,
                cart_jerk_ms3,
                orientation_jerk_rads3,
            });
        }
        SpeedLimitsCmd::SetCartesianServo {
            trans_velocity_ms,
            rot_velocity_rads,
        } => {
            ds.speed_limits
                .set_cartesian_servo_limits(trans_velocity_ms, rot_velocity_rads);
        }
        SpeedLimitsCmd::SetOverrideReduction { factor } => {
            ds.speed_limits.set_override_reduction(factor);
        }
    }

    // Record the new configuration in the session
    session::save_with_timestamp("speed_limits/config.json", ds.speed_limits.snapshot());

    TcResponse::Ok
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::{motion::MotionCmd, Vector3};
    use comms_if::eqpt::motion::NUM_JOINTS;

    #[test]
    fn test_make_safe_and_unsafe() {
        let mut ds = DataStore::default();

        assert_eq!(exec(&mut ds, &Tc::MakeSafe), TcResponse::Ok);
        assert!(ds.safe);

        assert_eq!(exec(&mut ds, &Tc::MakeUnsafe), TcResponse::Ok);
        assert!(!ds.safe);
    }

    #[test]
    fn test_make_unsafe_blocked_by_other_cause() {
        let mut ds = DataStore::default();
        ds.make_safe(SafeModeCause::MotionClientNotConnected);

        // The TC can only clear safe mode entered by the MakeSafe TC
        assert_eq!(exec(&mut ds, &Tc::MakeUnsafe), TcResponse::CannotExecute);
        assert!(ds.safe);
    }

    #[test]
    fn test_set_limits_updates_store() {
        let mut ds = DataStore::default();

        let tc = Tc::SpeedLimits(SpeedLimitsCmd::SetJointServo {
            relative_velocity: 0.5,
            relative_acceleration: 0.25,
            acceleration_override: 2.0,
        });

        assert_eq!(exec(&mut ds, &tc), TcResponse::Ok);

        let js = ds.speed_limits.joint_servo();
        assert_eq!(js.relative_velocity, 0.5);
        assert_eq!(js.relative_acceleration, 0.25);
        assert_eq!(js.acceleration_override, 2.0);
    }

    #[test]
    fn test_invalid_limits_leave_store_unchanged() {
        let mut ds = DataStore::default();
        let before = ds.speed_limits.snapshot();

        let tc = Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: f64::NAN,
            relative_acceleration: 0.5,
        });

        assert_eq!(exec(&mut ds, &tc), TcResponse::Invalid);
        assert_eq!(ds.speed_limits.snapshot(), before);
    }

    #[test]
    fn test_excessive_relative_factor_rejected() {
        let mut ds = DataStore::default();

        let tc = Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: 11.0,
            relative_acceleration: 0.5,
        });
        assert_eq!(exec(&mut ds, &tc), TcResponse::Invalid);

        // Exactly at the documented bound is accepted
        let tc = Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
            relative_velocity: 10.0,
            relative_acceleration: 0.5,
        });
        assert_eq!(exec(&mut ds, &tc), TcResponse::Ok);
    }

    #[test]
    fn test_motion_cmd_forwarded() {
        let mut ds = DataStore::default();

        let tc = Tc::Motion(MotionCmd::PtpJoint {
            target_pos_rad: vec![0.1; NUM_JOINTS],
        });

        assert_eq!(exec(&mut ds, &tc), TcResponse::Ok);
        assert!(ds.motion_mgr_input.cmd.is_some());
    }

    #[test]
    fn test_invalid_motion_rejected() {
        let mut ds = DataStore::default();

        let tc = Tc::Motion(MotionCmd::PtpJoint {
            target_pos_rad: vec![0.1; 3],
        });

        assert_eq!(exec(&mut ds, &tc), TcResponse::Invalid);
        assert!(ds.motion_mgr_input.cmd.is_none());
    }

    #[test]
    fn test_make_safe_drops_pending_motion() {
        use util::module::State;

        let mut ds = DataStore::default();

        // A motion TC and a MakeSafe can arrive in the same cycle's drain.
        // The pending command must not survive into motion manager
        // processing, or one demand would still go out while safe.
        let tc = Tc::Motion(MotionCmd::PtpJoint {
            target_pos_rad: vec![0.1; NUM_JOINTS],
        });
        assert_eq!(exec(&mut ds, &tc), TcResponse::Ok);
        assert!(ds.motion_mgr_input.cmd.is_some());

        assert_eq!(exec(&mut ds, &Tc::MakeSafe), TcResponse::Ok);
        assert!(ds.motion_mgr_input.cmd.is_none());

        let (out, _) = ds.motion_mgr.proc(&ds.motion_mgr_input).unwrap();
        assert!(out.dems.is_none());
    }

    #[test]
    fn test_motion_refused_while_safe() {
        let mut ds = DataStore::default();
        ds.make_safe(SafeModeCause::MakeSafeTc);

        let tc = Tc::Motion(MotionCmd::PtpJoint {
            target_pos_rad: vec![0.1; NUM_JOINTS],
        });
        assert_eq!(exec(&mut ds, &tc), TcResponse::CannotExecute);
        assert!(ds.motion_mgr_input.cmd.is_none());

        // Limits may still be reconfigured while safe
        let tc = Tc::SpeedLimits(SpeedLimitsCmd::SetCartesianServo {
            trans_velocity_ms: Vector3::new(0.5, 0.5, 0.5),
            rot_velocity_rads: Vector3::new(0.2, 0.2, 0.2),
        });
        assert_eq!(exec(&mut ds, &tc), TcResponse::Ok);
    }
}
