//! # Equipment Interface
//!
//! Structures exchanged with equipment executables, currently only the motion
//! controller, plus the unit conversions their values need.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod motion;
pub mod units;
