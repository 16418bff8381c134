//! # Motion Control Executable
//!
//! This executable stands on the controller side of the demands interface. It accepts motion
//! demands from the arm executable, validates them, and acknowledges each one before actuation.
//! Demands arrive with any limit overrides already applied by the arm side, so the values seen
//! here are in the controller's native units.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion server abstraction.
mod motion_server;

/// Parameters for the motion executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use comms_if::eqpt::motion::MotionDemsResponse;
use log::{info, trace, warn};

// Internal
use motion_server::MotionServer;
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("motion_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Could not initialise logging")?;

    info!("Motion Control Executable\n");
    info!("Session root: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params = util::params::load("motion_exec.toml")?;

    info!("Motion exec parameters loaded");

    // ---- SERVER INITIALISATION ----

    let mut server: MotionServer =
        MotionServer::new(&params).wrap_err("Failed to initialise server")?;

    info!("Motion server ready");

    // ---- MAIN LOOP ----

    info!("Init complete, main loop starting in safe mode");

    let mut safe_mode = true;

    loop {
        // Wait for the next demand from the arm exec
        let dems = match server.get_demands() {
            Some(d) => {
                if safe_mode {
                    info!("Received valid demand, exiting safe mode");
                    safe_mode = false;
                }
                d
            }
            None => {
                if !safe_mode {
                    warn!("No demands received, entering safe mode");
                    safe_mode = true;
                }
                continue;
            }
        };

        trace!("Received demands, validating...");

        // Reject demands the controller could not actuate
        if !dems.is_valid() {
            warn!("Received invalid demands: {:#?}", dems);

            if let Err(e) = server.send_dems_response(&MotionDemsResponse::DemsInvalid) {
                warn!("Couldn't send response to client, entering safe mode: {}", e);
                safe_mode = true;
            }

            continue;
        }

        trace!("Demand valid, acknowledging");

        // Acknowledge the demand
        match server.send_dems_response(&MotionDemsResponse::DemsOk) {
            Ok(_) => (),
            Err(e) => {
                warn!("Couldn't send response to client, entering safe mode: {}", e);
                safe_mode = true;
                continue;
            }
        }

        // TODO: drive the joint controllers with the accepted demand
        info!("Accepted demand: {:#?}", dems);
    }
}
