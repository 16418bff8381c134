//! # Motion Client
//!
//! The motion client sends motion demands to the motion exec and collects the
//! response confirming whether the demands were accepted.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::motion::{MotionDems, MotionDemsResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The motion client
pub struct MotionClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MotionClientError {
    #[error("Error in the underlying socket: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Not connected to the motion exec")]
    NotConnected,

    #[error("Could not send the demands: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive the motion exec's response: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialise the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the motion exec's response: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The motion exec responded with a message which was not valid UTF-8")]
    NonUtf8Response,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionClient {
    /// Create a new motion client on the demands endpoint given in `params`.
    ///
    /// Does not block waiting for the motion exec to connect.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, MotionClientError> {
        // TODO: read the socket options from net.toml
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 50,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.motion_dems_endpoint,
        )
        .map_err(MotionClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// True if the motion exec is currently connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Send the given demands to the motion exec, returning the server's
    /// response.
    ///
    /// Blocks for up to the socket's receive timeout waiting for the
    /// response. A timeout surfaces as a `RecvError`.
    pub fn send_demands(
        &mut self,
        dems: &MotionDems,
    ) -> Result<MotionDemsResponse, MotionClientError> {
        if !self.socket.connected() {
            return Err(MotionClientError::NotConnected);
        }

        let dems_str =
            serde_json::to_string(dems).map_err(MotionClientError::SerializationError)?;

        self.socket
            .send(&dems_str, 0)
            .map_err(MotionClientError::SendError)?;

        let response_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(MotionClientError::NonUtf8Response),
            // Includes no response arriving within the timeout
            Err(e) => return Err(MotionClientError::RecvError(e)),
        };

        serde_json::from_str(&response_str).map_err(MotionClientError::DeserializeError)
    }
}
