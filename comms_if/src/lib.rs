//! # Communications interface crate
//!
//! Defines everything the executables exchange: telecommands and their
//! responses, equipment demand structures, and the network layer carrying
//! them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions, parsing, and validation
pub mod tc;

/// Demand and response definitions for equipment (the motion controller)
pub mod eqpt;

/// Networking abstractions over zmq
pub mod net;
