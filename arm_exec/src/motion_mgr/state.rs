//! Implementations for the MotionMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::convert::TryInto;

// Internal
use super::{MotionMgrError, Params};
use comms_if::{
    eqpt::motion::{
        CartesianServoMotion, JointServoMotion, MotionDems, Pose, PtpCartesianMotion,
        PtpJointMotion, NUM_JOINTS,
    },
    tc::{motion::MotionCmd, Quaternion, Vector3},
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion manager module state
///
/// The motion manager turns validated motion commands into demands for the
/// motion exec. Point to point commands produce a single demand on the cycle
/// they arrive. Servo commands are reissued every cycle until they are
/// replaced, stopped, or go stale.
#[derive(Default)]
pub struct MotionMgr {
    pub(crate) params: Params,

    /// Demand built from the most recent motion command. Kept between cycles
    /// for servo streams.
    active_dems: Option<MotionDems>,

    /// Number of cycles since the active servo target was last refreshed.
    cycles_since_servo_cmd: u64,
}

/// Input data to the motion manager.
#[derive(Default)]
pub struct InputData {
    /// The motion command to start executing, or `None` when the cycle
    /// carries no new command.
    pub cmd: Option<MotionCmd>,
}

/// Output data from the motion manager.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct OutputData {
    /// The demand to issue to the motion exec this cycle, or `None` if no
    /// motion is demanded.
    pub dems: Option<MotionDems>,
}

/// Status report for motion manager processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Raised on the cycle a servo stream target goes stale and streaming
    /// stops.
    pub servo_stream_stale: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotionMgr {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MotionMgrError;

    /// Initialise the motion manager.
    ///
    /// Init data is the name of the manager's parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        Ok(())
    }

    /// Perform cyclic processing of the motion manager.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        // Take on a new command if one arrived this cycle
        if let Some(ref cmd) = input_data.cmd {
            if !cmd.is_valid() {
                return Err(MotionMgrError::InvalidCmd(cmd.clone()));
            }

            self.active_dems = dems_from_cmd(cmd);
            self.cycles_since_servo_cmd = 0;
        }

        // Work out the demand to issue this cycle
        let dems = match self.active_dems {
            // Point to point motions are issued exactly once
            Some(d @ MotionDems::PtpJoint(_)) | Some(d @ MotionDems::PtpCartesian(_)) => {
                self.active_dems = None;
                Some(d)
            }

            // Servo targets are reissued every cycle until they go stale
            Some(d @ MotionDems::JointServo(_)) | Some(d @ MotionDems::CartesianServo(_)) => {
                if self.cycles_since_servo_cmd > self.params.servo_stream_timeout_cycles {
                    report.servo_stream_stale = true;
                    self.active_dems = None;
                    None
                } else {
                    self.cycles_since_servo_cmd += 1;
                    Some(d)
                }
            }

            None => None,
        };

        trace!("MotionMgr output: {:?}", dems);

        Ok((OutputData { dems }, report))
    }
}

impl MotionMgr {
    /// Halt any active motion.
    ///
    /// After this call no further demands are produced until a new motion
    /// command arrives.
    pub fn make_safe(&mut self) {
        self.active_dems = None;
        self.cycles_since_servo_cmd = 0;
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the motion exec demand corresponding to the given command.
///
/// `Stop` produces no demand, it clears any active motion instead.
fn dems_from_cmd(cmd: &MotionCmd) -> Option<MotionDems> {
    match cmd {
        MotionCmd::JointServo { target_pos_rad } => joint_array(target_pos_rad)
            .map(|t| MotionDems::JointServo(JointServoMotion::new(t))),
        MotionCmd::PtpJoint { target_pos_rad } => joint_array(target_pos_rad)
            .map(|t| MotionDems::PtpJoint(PtpJointMotion::new(t))),
        MotionCmd::PtpCartesian {
            position_m,
            attitude_q,
        } => Some(MotionDems::PtpCartesian(PtpCartesianMotion::new(
            pose_from(position_m, attitude_q),
        ))),
        MotionCmd::CartesianServo {
            position_m,
            attitude_q,
        } => Some(MotionDems::CartesianServo(CartesianServoMotion::new(
            pose_from(position_m, attitude_q),
        ))),
        MotionCmd::Stop => None,
    }
}

/// Convert the command's joint target vector into the fixed size demand
/// array. Returns `None` if the vector is the wrong length, which command
/// validation prevents.
fn joint_array(target: &[f64]) -> Option<[f64; NUM_JOINTS]> {
    target.try_into().ok()
}

fn pose_from(position_m: &Vector3, attitude_q: &Quaternion) -> Pose {
    Pose {
        position_m: (*position_m).into(),
        attitude_q: (*attitude_q).into(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn joint_targets() -> Vec<f64> {
        vec![0.1; NUM_JOINTS]
    }

    fn proc_cmd(mgr: &mut MotionMgr, cmd: MotionCmd) -> (OutputData, StatusReport) {
        mgr.proc(&InputData { cmd: Some(cmd) }).unwrap()
    }

    fn proc_empty(mgr: &mut MotionMgr) -> (OutputData, StatusReport) {
        mgr.proc(&InputData::default()).unwrap()
    }

    #[test]
    fn test_ptp_issued_once() {
        let mut mgr = MotionMgr::default();

        let (out, _) = proc_cmd(
            &mut mgr,
            MotionCmd::PtpJoint {
                target_pos_rad: joint_targets(),
            },
        );
        assert!(matches!(out.dems, Some(MotionDems::PtpJoint(_))));

        // No demand on the following cycle
        let (out, _) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
    }

    #[test]
    fn test_servo_streams_until_stale() {
        let mut mgr = MotionMgr::default();
        mgr.params.servo_stream_timeout_cycles = 2;

        let (out, _) = proc_cmd(
            &mut mgr,
            MotionCmd::JointServo {
                target_pos_rad: joint_targets(),
            },
        );
        assert!(matches!(out.dems, Some(MotionDems::JointServo(_))));

        // Reissued while within the timeout
        for _ in 0..2 {
            let (out, report) = proc_empty(&mut mgr);
            assert!(matches!(out.dems, Some(MotionDems::JointServo(_))));
            assert!(!report.servo_stream_stale);
        }

        // Stale on the next cycle, stream stops
        let (out, report) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
        assert!(report.servo_stream_stale);

        // Flag is only raised on the transition cycle
        let (out, report) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
        assert!(!report.servo_stream_stale);
    }

    #[test]
    fn test_servo_refresh_resets_staleness() {
        let mut mgr = MotionMgr::default();
        mgr.params.servo_stream_timeout_cycles = 1;

        proc_cmd(
            &mut mgr,
            MotionCmd::JointServo {
                target_pos_rad: joint_targets(),
            },
        );
        proc_empty(&mut mgr);

        // Refreshing the target restarts the stream timeout
        let (out, _) = proc_cmd(
            &mut mgr,
            MotionCmd::JointServo {
                target_pos_rad: joint_targets(),
            },
        );
        assert!(out.dems.is_some());

        let (out, report) = proc_empty(&mut mgr);
        assert!(out.dems.is_some());
        assert!(!report.servo_stream_stale);
    }

    #[test]
    fn test_stop_clears_active_motion() {
        let mut mgr = MotionMgr::default();
        mgr.params.servo_stream_timeout_cycles = 10;

        let (out, _) = proc_cmd(
            &mut mgr,
            MotionCmd::CartesianServo {
                position_m: Vector3::new(0.1, 0.2, 0.3),
                attitude_q: Quaternion {
                    w: 1.0,
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                },
            },
        );
        assert!(matches!(out.dems, Some(MotionDems::CartesianServo(_))));

        let (out, _) = proc_cmd(&mut mgr, MotionCmd::Stop);
        assert!(out.dems.is_none());

        let (out, _) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
    }

    #[test]
    fn test_invalid_cmd_rejected() {
        let mut mgr = MotionMgr::default();

        let result = mgr.proc(&InputData {
            cmd: Some(MotionCmd::JointServo {
                target_pos_rad: vec![0.1, 0.2, 0.3],
            }),
        });

        assert!(matches!(result, Err(MotionMgrError::InvalidCmd(_))));
    }

    #[test]
    fn test_make_safe_clears_motion() {
        let mut mgr = MotionMgr::default();
        mgr.params.servo_stream_timeout_cycles = 10;

        proc_cmd(
            &mut mgr,
            MotionCmd::JointServo {
                target_pos_rad: joint_targets(),
            },
        );

        mgr.make_safe();

        let (out, _) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
    }

    #[test]
    fn test_new_command_replaces_active() {
        let mut mgr = MotionMgr::default();
        mgr.params.servo_stream_timeout_cycles = 10;

        proc_cmd(
            &mut mgr,
            MotionCmd::JointServo {
                target_pos_rad: joint_targets(),
            },
        );

        // A PTP command takes over from the servo stream
        let (out, _) = proc_cmd(
            &mut mgr,
            MotionCmd::PtpCartesian {
                position_m: Vector3::new(0.4, 0.0, 0.6),
                attitude_q: Quaternion {
                    w: 1.0,
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                },
            },
        );
        assert!(matches!(out.dems, Some(MotionDems::PtpCartesian(_))));

        // And is not reissued
        let (out, _) = proc_empty(&mut mgr);
        assert!(out.dems.is_none());
    }
}
