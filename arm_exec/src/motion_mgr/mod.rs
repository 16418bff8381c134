//! Motion manager module

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use comms_if::tc::motion::MotionCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum MotionMgrError {
    #[error("Received an invalid motion command: {0:#?}")]
    InvalidCmd(MotionCmd),
}
