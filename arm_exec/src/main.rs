//! Main arm-side executable entry point.
//!
//! The exec runs a fixed-rate control cycle. Each cycle handles pending
//! telecommands first, then runs the motion manager, and finally dispatches
//! any resulting demand to the motion exec.
//!
//! Speed limits live in a store that telecommands can reconfigure at any
//! time, including between the cycles of an active servo stream. The limits
//! in force are applied to each demand immediately before it is sent, so
//! every demand leaves with the settings of the cycle it was dispatched on.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

use arm_lib::{
    data_store::{DataStore, SafeModeCause},
    motion_client::{MotionClient, MotionClientError},
    speed_limits::{SpeedLimits, SpeedLimitsParams},
    tc_client::{TcClient, TcClientError},
    *,
};
use comms_if::{eqpt::motion::MotionDemsResponse, net::NetParams, tc::TcResponse};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, error, info, warn};
use std::{
    env, thread,
    time::{Duration, Instant},
};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Length of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Cycle rate in Hz, used to pick out the once-per-second cycles.
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Consecutive receive errors from the motion server tolerated before safe
/// mode is engaged.
const MAX_MOTION_RECV_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Could not initialise logging")?;

    info!("Manipulator Control Executable\n");
    info!("Session root: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load the network parameters")?;

    let speed_limits_params: SpeedLimitsParams =
        util::params::load("speed_limits.toml").wrap_err("Could not load speed limits params")?;

    info!("Net and speed limit parameters loaded");

    // ---- SELECT TC SOURCE ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    // One optional argument, the path to a TC script
    let script_path = match args.len() {
        1 => None,
        2 => Some(&args[1]),
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    let mut tc_source = match script_path {
        Some(path) => {
            info!("Executing TC script \"{}\"", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Script contains {} TCs over {:.02} s\n",
                si.get_num_tcs(),
                si.get_duration()
            );

            TcSource::Script(si)
        }
        None => {
            info!("No script given, TCs will be taken from the ground server\n");
            TcSource::None
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules");

    let mut ds = DataStore::default();

    // Seed the speed limits store from the parameter file
    ds.speed_limits = SpeedLimits::new(&speed_limits_params);

    // ---- INITIALISE MODULES ----

    ds.motion_mgr
        .init("motion_mgr.toml", &session)
        .wrap_err("Failed to initialise MotionMgr")?;
    info!("MotionMgr init complete");

    info!("All modules initialised\n");

    // ---- INITIALISE NETWORK ----

    info!("Bringing the network up");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    if matches!(tc_source, TcSource::None) {
        tc_source = TcSource::Remote(
            TcClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise the TcClient")?,
        );
        info!("TcClient ready");
    }

    let mut motion_client =
        MotionClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise the MotionClient")?;
    info!("MotionClient ready");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    loop {
        let cycle_start_instant = Instant::now();

        // Reset the per-cycle state
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- MOTION EXEC CONNECTION ----

        // Demands are only sent on cycles with active motion, so the
        // connection has to be watched here rather than through send errors
        // alone.
        if motion_client.is_connected() {
            ds.make_unsafe(SafeModeCause::MotionClientNotConnected).ok();
        } else {
            if !ds.safe {
                error!("Connection to the MotionServer lost");
            }
            ds.make_safe(SafeModeCause::MotionClientNotConnected);
        }

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            // Nothing to execute without a source, so stop
            TcSource::None => raise_error!("No TC source configured"),

            TcSource::Remote(ref client) => {
                // Safe mode follows the TC connection state
                if client.is_connected() {
                    ds.make_unsafe(SafeModeCause::TcClientNotConnected).ok();
                } else {
                    ds.make_safe(SafeModeCause::TcClientNotConnected);
                }

                // Drain all TCs waiting on the socket
                loop {
                    match client.receive_tc() {
                        Ok(Some(tc)) => {
                            // The processor refuses motion while in safe mode, so remote and
                            // script sources share a single gate
                            let response = tc_processor::exec(&mut ds, &tc);

                            match client.send_response(response) {
                                Ok(_) => (),
                                Err(e) => warn!("Could not respond to TC: {}", e),
                            }
                        }
                        Ok(None) => break,
                        Err(TcClientError::NotConnected) => {
                            if !ds.safe {
                                error!("Connection to the TC server lost");
                            }

                            ds.make_safe(SafeModeCause::TcClientNotConnected);
                            break;
                        }
                        Err(TcClientError::TcParseError(e)) => {
                            warn!("Could not parse received TC: {}", e);
                            break;
                        }
                        Err(e) => {
                            return Err(e)
                                .wrap_err("An error occurred while receiving TCs from the server")
                        }
                    }
                }
            }

            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in &tc_vec {
                        let response = tc_processor::exec(&mut ds, tc);

                        if response != TcResponse::Ok {
                            warn!("TC from script got response {:?}: {:#?}", response, tc);
                        }
                    }
                }
                // Script finished, end the exec
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
        }

        // ---- 1 HZ TASKS ----

        if ds.is_1_hz_cycle && ds.safe {
            info!("In safe mode, cause: {:?}", ds.safe_cause);
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.motion_mgr.proc(&ds.motion_mgr_input) {
            Ok((o, r)) => {
                ds.motion_mgr_output = o;
                ds.motion_mgr_status_rpt = r;
            }
            // A failed proc means the command was rejected, not that the exec
            // is broken, so warn and carry on
            Err(e) => warn!("Error during MotionMgr processing: {}", e),
        }

        if ds.motion_mgr_status_rpt.servo_stream_stale {
            warn!("Servo target stream went stale, stopping servo motion");
        }

        // ---- DEMAND DISPATCH ----

        if let Some(mut dems) = ds.motion_mgr_output.dems {
            // Apply the limits in force on this cycle before the demand leaves
            ds.speed_limits.apply(&mut dems);

            match motion_client.send_demands(&dems) {
                Ok(MotionDemsResponse::DemsOk) => {
                    ds.num_consec_motion_recv_errors = 0;
                }
                Ok(r) => warn!("Received non-nominal response from MotionServer: {:?}", r),
                Err(MotionClientError::NotConnected) => {
                    if !ds.safe {
                        error!("Connection to the MotionServer lost");
                    }
                    ds.make_safe(SafeModeCause::MotionClientNotConnected);
                }
                Err(MotionClientError::RecvError(_)) => {
                    ds.num_consec_motion_recv_errors += 1;

                    if ds.num_consec_motion_recv_errors > MAX_MOTION_RECV_ERROR_LIMIT {
                        if !ds.safe {
                            error!(
                                "MotionClient receive error limit ({}) exceeded",
                                MAX_MOTION_RECV_ERROR_LIMIT
                            );
                        }
                        ds.make_safe(SafeModeCause::MotionClientNotConnected);
                    }
                }
                Err(e) => warn!("MotionClient processing error: {}", e),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = cycle_start_instant.elapsed();

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(remaining) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(remaining);
            }
            None => {
                warn!(
                    "Cycle overrun of {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("Execution finished");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Where the exec's telecommands come from.
enum TcSource {
    None,
    Remote(TcClient),
    Script(ScriptInterpreter),
}
