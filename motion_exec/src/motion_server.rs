//! # Motion Server Module
//!
//! This module abstracts over the networking side of the motion executable. The server accepts
//! connections from the client in the arm executable, allowing demands to be received from the
//! client and acknowledged.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::motion::{MotionDems, MotionDemsResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};
use log::warn;

use crate::params::MotionExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the motion executable.
///
/// The server accepts connections from the client in the arm executable. Each received demand
/// must be answered with a response before the next demand can be read.
pub struct MotionServer {
    /// REP socket bound to the demands endpoint
    dems_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`MotionServer`]
#[derive(thiserror::Error, Debug)]
pub enum MotionServerError {
    #[error("Error in the underlying socket: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not serialise the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not send the response to the arm exec: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionServer {
    /// Create a new motion server bound to the demands endpoint in `params`.
    ///
    /// Does not block waiting for the arm exec to connect.
    pub fn new(params: &MotionExecParams) -> Result<Self, MotionServerError> {
        let ctx = zmq::Context::new();

        let dems_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 200,
            send_timeout: 10,
            ..Default::default()
        };

        let dems_socket = MonitoredSocket::new(
            &ctx,
            zmq::REP,
            dems_socket_options,
            &params.demands_endpoint,
        )?;

        Ok(Self { dems_socket })
    }

    /// Read the next demand sent by the arm exec, if there is one.
    ///
    /// When demands are returned the user MUST call [`MotionServer::send_dems_response`] at the
    /// earliest opportunity in order to notify the client. Messages which cannot be parsed are
    /// answered with [`MotionDemsResponse::DemsInvalid`] here, keeping the REP request cycle
    /// balanced.
    ///
    /// `None` is returned if no valid demand is received. In this case the exec must stop the
    /// motion.
    pub fn get_demands(&mut self) -> Option<MotionDems> {
        // Read from the socket, a timeout simply means no demand this pass
        let msg = match self.dems_socket.recv_msg(0) {
            Ok(m) => m,
            Err(_) => return None,
        };

        // A message was taken off the socket, so the REP state machine needs
        // an answer even if the message turns out to be unusable
        let dems = match msg.as_str() {
            Some(s) => match serde_json::from_str(s) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("Could not deserialize demands: {}", e);
                    None
                }
            },
            None => {
                warn!("Demands message was not valid UTF-8");
                None
            }
        };

        if dems.is_none() {
            if let Err(e) = self.send_dems_response(&MotionDemsResponse::DemsInvalid) {
                warn!("Could not reject unusable demands: {}", e);
            }
        }

        dems
    }

    /// Send a response to the client answering the last received demand.
    pub fn send_dems_response(
        &mut self,
        response: &MotionDemsResponse,
    ) -> Result<(), MotionServerError> {
        let resp_str =
            serde_json::to_string(response).map_err(MotionServerError::SerializationError)?;

        match self.dems_socket.send(&resp_str, 0) {
            Ok(_) => Ok(()),
            Err(e) => Err(MotionServerError::SendError(e)),
        }
    }
}

impl From<MonitoredSocketError> for MotionServerError {
    fn from(e: MonitoredSocketError) -> Self {
        MotionServerError::SocketError(e)
    }
}
