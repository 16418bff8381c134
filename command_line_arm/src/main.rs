//! # Arm Console
//!
//! Interactive console which sends telecommands to the arm executable and
//! prints the response to each one.
//!
//! Commands are typed in the same form as TC script entries, for example:
//!
//! ```text
//! limits ptp-joint 0.5 0.5
//! mnvr ptp-joint 0.0 0.5 0.0 -1.2 0.0 0.9 0.0
//! safe
//! ```
//!
//! `exit` or `quit` leaves the console, `help` lists the commands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use comms_if::{
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
    tc::{Tc, TcResponse},
};
use rustyline::{error::ReadlineError, DefaultEditor};
use structopt::StructOpt;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "Arm $ ";
const HISTORY_PATH: &str = "history.txt";

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load the network parameters")?;

    // Socket options for the TC socket. The console binds and the arm
    // executable's TC client connects to it.
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        linger: 1,
        recv_timeout: 1000,
        send_timeout: 1000,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &net_params.tc_endpoint)
        .wrap_err("Could not open the TC socket")?;

    println!("Arm console on {}, type \"exit\" to leave", net_params.tc_endpoint);

    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No previous history");
    }

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if line == "exit" || line == "quit" {
                    break;
                }

                if let Some(tc) = parse(line) {
                    send_tc(&socket, &tc);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Unhandled Error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_PATH)
        .wrap_err("Could not save the command history")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a console line into a telecommand, printing the parser's own message
/// if the line isn't one.
fn parse(line: &str) -> Option<Tc> {
    // The first element is taken as the binary name by the parser
    let words = std::iter::once("tc").chain(line.split_whitespace());

    match Tc::from_iter_safe(words) {
        Ok(tc) => Some(tc),
        Err(e) => {
            println!("{}", e.message);
            None
        }
    }
}

/// Send the TC to the executive and print the response.
fn send_tc(socket: &MonitoredSocket, tc: &Tc) {
    let tc_json = match tc.to_json() {
        Ok(j) => j,
        Err(e) => {
            println!("Could not serialize the TC: {}", e);
            return;
        }
    };

    if let Err(e) = socket.send(&tc_json, 0) {
        println!("Could not send the TC: {}", e);
        return;
    }

    match socket.recv_string(0) {
        Ok(Ok(response)) => match serde_json::from_str::<TcResponse>(&response) {
            Ok(r) => println!("{:?}", r),
            Err(e) => println!("Could not parse the response: {}", e),
        },
        Ok(Err(_)) => println!("Response was not valid UTF-8"),
        Err(e) => println!("No response from the executive: {}", e),
    }
}
