//! Speed limit store module
//!
//! This module holds the run time configurable velocity, acceleration and
//! jerk limit settings for the arm, one group per motion mode, and applies
//! them to every motion demand just before it is sent to the motion exec.
//!
//! Limit settings arrive over the speed limits telecommands and may change at
//! any point during execution. A setting only overrides the motion
//! controller's own default when it is strictly positive, commanding a non
//! positive value returns that field to the controller default.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod apply;
mod params;
mod store;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use store::*;
