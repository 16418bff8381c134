//! Parameters structure for the motion manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motion manager.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Number of cycles a servo target is reissued for beyond the cycle it
    /// was commanded on. Once this many cycles pass without a fresh target
    /// the stream is considered stale and is stopped.
    ///
    /// Units: cycles
    pub servo_stream_timeout_cycles: u64,
}
