//! # Motion Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the motion executable, loaded from `motion_exec.toml`.
#[derive(Deserialize, Default)]
pub struct MotionExecParams {
    /// Endpoint the demands socket binds to
    pub demands_endpoint: String,
}
