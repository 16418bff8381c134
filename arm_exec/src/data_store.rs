//! # Data Store
//!
//! Central state of the exec, shared between the main loop and the TC
//! processor.

use log::{info, warn};

use crate::{motion_mgr, speed_limits::SpeedLimits};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Why the arm was put into safe mode.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    TcClientNotConnected,
    MotionClientNotConnected,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All the state the exec carries between cycles.
#[derive(Default)]
pub struct DataStore {
    // Cycle bookkeeping
    /// Cycles completed since the exec started
    pub num_cycles: u128,

    /// True on cycles which fall on a whole second
    pub is_1_hz_cycle: bool,

    /// Session time at the start of this cycle
    pub elapsed_time_s: f64,

    // Safe mode
    /// True while the arm is in safe mode.
    pub safe: bool,

    /// The cause which put the arm into safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Speed limits
    /// The current limit settings applied to every outgoing motion demand.
    pub speed_limits: SpeedLimits,

    // MotionMgr
    pub motion_mgr: motion_mgr::MotionMgr,
    pub motion_mgr_input: motion_mgr::InputData,
    pub motion_mgr_output: motion_mgr::OutputData,
    pub motion_mgr_status_rpt: motion_mgr::StatusReport,

    // Fault counters
    /// Consecutive cycles which overran the cycle period
    pub num_consec_cycle_overruns: u64,

    /// Consecutive receive errors from the motion client
    pub num_consec_motion_recv_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Put the arm into safe mode for the given cause, halting any motion.
    ///
    /// If the arm is already safe the original cause is kept.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Entering safe mode, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Halt any active motion, including a command accepted earlier in
            // this cycle which the motion manager hasn't consumed yet
            self.motion_mgr.make_safe();
            self.motion_mgr_input.cmd = None;
        }
    }

    /// Try to leave safe mode by clearing the given cause.
    ///
    /// Safe mode only lifts when `cause` matches the cause that engaged it,
    /// so a `MakeUnsafe` TC cannot override a lost connection, and a
    /// returning connection cannot override an operator's `MakeSafe`. Not
    /// being in safe mode is a success.
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(()),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                info!("Safe mode cleared, root cause was {:?}", cause);
                Ok(())
            }
        }
    }

    /// Start-of-cycle housekeeping.
    ///
    /// Wipes the per-cycle module IO, refreshes the session clock, and flags
    /// the cycles falling on whole seconds.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.motion_mgr_input = motion_mgr::InputData::default();
        self.motion_mgr_output = motion_mgr::OutputData::default();
        self.motion_mgr_status_rpt = motion_mgr::StatusReport::default();

        self.elapsed_time_s = util::session::get_elapsed_seconds();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
