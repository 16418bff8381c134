//! Utility library shared by the manipulator control executables

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
#[macro_use]
pub mod logger;
pub mod module;
pub mod params;
pub mod script_interpreter;
pub mod session;
pub mod time;

// ---------------------------------------------------------------------------
// REEXPORTS
// ---------------------------------------------------------------------------

pub use comms_if;

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Log an unrecoverable error and panic.
///
/// Prefer returning a `Result` wherever the caller could plausibly handle the
/// failure, this is for states the exec cannot continue from.
#[macro_export]
macro_rules! raise_error {
    () => ({
        log::error!("Fatal error raised with no message");
        std::panic!("Fatal error");
    });
    ($fmt:expr) => ({
        log::error!("{}", $fmt);
        std::panic!("Fatal error");
    });
    ($fmt:expr, $($arg:tt)*) => ({
        log::error!("{}", std::format_args!($fmt, $($arg)*));
        std::panic!("Fatal error");
    });
}
