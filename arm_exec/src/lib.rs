//! # Arm library.
//!
//! This library allows other crates in the workspace to access items defined inside the arm
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Datastore - the shared store of state passed between modules in the main loop
pub mod data_store;

/// Motion client - sends motion demands to the motion exec
pub mod motion_client;

/// Motion manager module - turns motion commands into per cycle motion demands
pub mod motion_mgr;

/// Speed limits module - stores limit settings and applies them to outgoing demands
pub mod speed_limits;

/// Telecommand client - receives telecommands from the console or ground station
pub mod tc_client;
