//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable giving the root of the software
/// installation.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

/// Get the software root directory from the environment.
///
/// Parameter files and session directories are located relative to this root.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
