//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod motion;
pub mod speed_limits;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json;
use std::str::FromStr;
use structopt::StructOpt;
use thiserror::Error;

// Internal
use motion::MotionCmd;
use speed_limits::SpeedLimitsCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the executive by the ground
/// station.
///
/// TCs are carried on the wire as JSON, produced by [`Tc::to_json`] and read
/// by [`Tc::from_json`].
///
/// Negative numbers are valid argument values (the speed limit commands use
/// non-positive values as the "leave controller default" marker), so the
/// parser is set to accept them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(
    global_settings = &[structopt::clap::AppSettings::AllowNegativeNumbers]
)]
pub enum Tc {
    /// Put the executive into safe mode, halting all motion output.
    #[structopt(name = "safe")]
    MakeSafe,

    /// Take the executive out of safe mode.
    #[structopt(name = "unsafe")]
    MakeUnsafe,

    /// Reconfigure the speed limits applied to outgoing motion.
    #[structopt(name = "limits")]
    SpeedLimits(SpeedLimitsCmd),

    /// Command a motion of the manipulator.
    #[structopt(name = "mnvr")]
    Motion(MotionCmd),
}

/// Response to a telecommand, sent back to the source of the TC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted and executed.
    Ok,

    /// The TC was well formed but cannot be executed in the current state,
    /// for example because the executive is in safe mode.
    CannotExecute,

    /// The TC was malformed or failed validation and has been discarded.
    Invalid,
}

/// Errors raised while parsing a TC.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("The TC is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A three component vector carried in a telecommand.
///
/// On the command line a vector is written as three comma-separated
/// components, for example `1.0,0.5,0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An attitude quaternion carried in a telecommand.
///
/// On the command line a quaternion is written as four comma-separated
/// components in scalar-first order, for example `1.0,0.0,0.0,0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a TC from its JSON wire form.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise this TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// True if all components are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl FromStr for Vector3 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let comps = parse_components(s, 3)?;
        Ok(Vector3::new(comps[0], comps[1], comps[2]))
    }
}

impl Quaternion {
    /// True if all components are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// The euclidean norm of the quaternion.
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(q: Quaternion) -> Self {
        [q.w, q.x, q.y, q.z]
    }
}

impl FromStr for Quaternion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let comps = parse_components(s, 4)?;
        Ok(Quaternion {
            w: comps[0],
            x: comps[1],
            y: comps[2],
            z: comps[3],
        })
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a comma-separated list of floats with exactly `expected` elements.
fn parse_components(s: &str, expected: usize) -> Result<Vec<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != expected {
        return Err(format!(
            "Expected {} comma-separated components, found {}",
            expected,
            parts.len()
        ));
    }

    parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| format!("Invalid component \"{}\": {}", p, e))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tc_json_round_trip() {
        let tcs = vec![
            Tc::MakeSafe,
            Tc::MakeUnsafe,
            Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
                relative_velocity: 0.5,
                relative_acceleration: -1.0,
            }),
            Tc::SpeedLimits(SpeedLimitsCmd::SetCartesianServo {
                trans_velocity_ms: Vector3::new(1.0, 1.0, 1.0),
                rot_velocity_rads: Vector3::new(0.0, 0.0, 0.3),
            }),
            Tc::Motion(MotionCmd::Stop),
        ];

        for tc in tcs {
            let json = tc.to_json().unwrap();
            let parsed = Tc::from_json(&json).unwrap();
            assert_eq!(parsed, tc);
        }
    }

    #[test]
    fn test_tc_from_json_rejects_garbage() {
        assert!(matches!(
            Tc::from_json("{\"NotARealTc\": 4}"),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json("not json at all"),
            Err(TcParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_vector3_from_str() {
        assert_eq!(
            "1.0,0.5,0.0".parse::<Vector3>().unwrap(),
            Vector3::new(1.0, 0.5, 0.0)
        );
        assert_eq!(
            " 1.0, 0.5, 0.0 ".parse::<Vector3>().unwrap(),
            Vector3::new(1.0, 0.5, 0.0)
        );
        assert!("1.0,0.5".parse::<Vector3>().is_err());
        assert!("1.0,0.5,pears".parse::<Vector3>().is_err());
    }

    #[test]
    fn test_quaternion_from_str() {
        let q = "1.0,0.0,0.0,0.0".parse::<Quaternion>().unwrap();
        assert_eq!(q.w, 1.0);
        assert_eq!(q.norm(), 1.0);
        assert!("1.0,0.0,0.0".parse::<Quaternion>().is_err());
    }

    #[test]
    fn test_structopt_parse() {
        use structopt::StructOpt;

        let tc = Tc::from_iter_safe(vec!["tc", "safe"]).unwrap();
        assert_eq!(tc, Tc::MakeSafe);

        let tc = Tc::from_iter_safe(vec![
            "tc", "limits", "ptp-joint", "0.5", "0.25",
        ])
        .unwrap();
        assert_eq!(
            tc,
            Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
                relative_velocity: 0.5,
                relative_acceleration: 0.25,
            })
        );

        let tc = Tc::from_iter_safe(vec![
            "tc", "limits", "cart-servo", "1,1,1", "0.5,0.5,0.5",
        ])
        .unwrap();
        assert_eq!(
            tc,
            Tc::SpeedLimits(SpeedLimitsCmd::SetCartesianServo {
                trans_velocity_ms: Vector3::new(1.0, 1.0, 1.0),
                rot_velocity_rads: Vector3::new(0.5, 0.5, 0.5),
            })
        );

        // Non-positive values are the "leave controller default" marker and
        // must parse rather than being taken for flags
        let tc = Tc::from_iter_safe(vec![
            "tc", "limits", "ptp-joint", "-1.0", "0.25",
        ])
        .unwrap();
        assert_eq!(
            tc,
            Tc::SpeedLimits(SpeedLimitsCmd::SetPtpJoint {
                relative_velocity: -1.0,
                relative_acceleration: 0.25,
            })
        );

        assert!(Tc::from_iter_safe(vec!["tc", "selfdestruct"]).is_err());
    }
}
