//! # Script interpreter module
//!
//! Runs the exec from a TC script instead of a live ground connection. A
//! script is a plain text file of `time: tc;` entries, where `time` is
//! seconds since exec start and `tc` is a JSON telecommand:
//!
//! ```text
//! 1.0: {"SpeedLimits": {"SetOverrideReduction": {"factor": 0.5}}};
//! 2.5: "MakeSafe";
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::session::get_elapsed_seconds;
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand with the script time it is due at.
struct Command {
    /// Seconds after exec start this command becomes due
    exec_time_s: f64,

    /// The telecommand itself
    tc: Tc,
}

/// Issues the telecommands of a script as their times come due.
///
/// Call [`ScriptInterpreter::get_pending_tcs`] every cycle to collect the TCs
/// which are due at the current session time.
pub struct ScriptInterpreter {
    cmds: VecDeque<Command>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No script found at {0}")]
    ScriptNotFound(String),

    #[error("Could not read the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script contains no commands")]
    ScriptEmpty,

    #[error("Invalid timestamp \"{0}\", expected a decimal number of seconds")]
    InvalidTimestamp(String),

    #[error("The TC at {0} s is invalid: {1}")]
    InvalidTc(f64, TcParseError),
}

/// The TCs due according to the script clock.
pub enum PendingTcs {
    /// Nothing is due this cycle
    None,

    /// These TCs are due now
    Some(Vec<Tc>),

    /// Every command in the script has been issued
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Load and parse the script at the given path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let script = fs::read_to_string(path).map_err(ScriptError::ScriptLoadError)?;

        // An entry is `<seconds>: <json tc>;`, one per line
        let entry_re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        let mut cmds = VecDeque::new();

        for cap in entry_re.captures_iter(&script) {
            let exec_time_s: f64 = cap
                .get(1)
                .unwrap()
                .as_str()
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let tc = Tc::from_json(cap.get(3).unwrap().as_str())
                .map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            cmds.push_back(Command { exec_time_s, tc });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter { cmds })
    }

    /// Collect the TCs which are due at the current session time.
    pub fn get_pending_tcs(&mut self) -> PendingTcs {
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let current_time_s = get_elapsed_seconds();

        let mut tc_vec = Vec::new();

        // Commands are in script order, so everything due sits at the front
        // of the queue
        while self
            .cmds
            .front()
            .map_or(false, |cmd| cmd.exec_time_s < current_time_s)
        {
            tc_vec.push(self.cmds.pop_front().unwrap().tc);
        }

        if tc_vec.is_empty() {
            PendingTcs::None
        } else {
            PendingTcs::Some(tc_vec)
        }
    }

    /// Number of TCs still to be issued.
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Script time of the final command, in seconds.
    pub fn get_duration(&self) -> f64 {
        self.cmds.back().map_or(0.0, |c| c.exec_time_s)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_script(name: &str, content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_script() {
        let path = write_script(
            "script_interpreter_test_parse.txt",
            "0.1: \"MakeSafe\";\n\
             0.5: \"MakeUnsafe\";\n\
             1.0: {\"SpeedLimits\": {\"SetPtpJoint\": {\
                \"relative_velocity\": 0.5, \
                \"relative_acceleration\": 0.5}}};\n",
        );

        let si = ScriptInterpreter::new(&path).unwrap();

        assert_eq!(si.get_num_tcs(), 3);
        assert_eq!(si.get_duration(), 1.0);
    }

    #[test]
    fn test_empty_script() {
        let path = write_script("script_interpreter_test_empty.txt", "no commands here\n");

        assert!(matches!(
            ScriptInterpreter::new(&path),
            Err(ScriptError::ScriptEmpty)
        ));
    }

    #[test]
    fn test_invalid_tc() {
        let path = write_script(
            "script_interpreter_test_invalid.txt",
            "0.1: {\"NotARealTc\": 4};\n",
        );

        assert!(matches!(
            ScriptInterpreter::new(&path),
            Err(ScriptError::InvalidTc(_, _))
        ));
    }
}
