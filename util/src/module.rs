//! Common interface for cyclic modules
//!
//! Every cyclic module in the exec implements [`State`], which fixes the
//! shape of its initialisation and per-cycle processing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// State held by a cyclic module.
///
/// A module is initialised once at executive startup and then processed every
/// cycle of the main loop. All data a module needs from the rest of the
/// executive arrives through its `InputData`, and everything it produces
/// leaves through its `OutputData` and `StatusReport`.
pub trait State {
    /// Data handed to `init`, for example the name of the module's parameter
    /// file.
    type InitData;

    /// Error produced when initialisation fails.
    type InitError;

    /// Data the module consumes each cycle.
    type InputData;

    /// Data the module produces each cycle.
    type OutputData;

    /// Per-cycle report of the module's health and notable events.
    type StatusReport;

    /// Error produced when cyclic processing fails.
    type ProcError;

    /// Initialise the module, called once at exec startup before any
    /// processing takes place.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one cycle, turning the input data into output data and a
    /// status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
