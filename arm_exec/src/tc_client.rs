//! # Telecommand client
//!
//! Receives TCs from the ground server over a monitored REP socket and sends
//! back a [`TcResponse`] for each one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    tc::{Tc, TcParseError, TcResponse},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the ground station's TC server.
pub struct TcClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcClientError {
    #[error("Error in the underlying socket: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Not connected to the ground server")]
    NotConnected,

    #[error("Could not send the response to the ground server: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message from the ground server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialise the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the received telecommand: {0}")]
    TcParseError(TcParseError),

    #[error("Received a message which was not valid UTF-8")]
    NonUtf8Response,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcClient {
    /// Create a new TC client on the TC endpoint given in `params`.
    ///
    /// Does not block waiting for the ground server to connect.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TcClientError> {
        // TODO: read the socket options from net.toml
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: false,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REP, socket_options, &params.tc_endpoint)
            .map_err(TcClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// True if the ground server is currently connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive a single TC from the ground server.
    ///
    /// Call in a loop until `Ok(None)`, which signals that no TCs are waiting right now. A valid
    /// TC must be answered with [`TcClient::send_response`] before the next receive. If the TC
    /// cannot be parsed an `Invalid` response is sent automatically by this function.
    pub fn receive_tc(&self) -> Result<Option<Tc>, TcClientError> {
        if !self.socket.connected() {
            return Err(TcClientError::NotConnected);
        }

        let tc_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            // Not UTF-8, answer so the server is free to send the next TC
            Ok(Err(_)) => {
                self.send_response(TcResponse::Invalid)?;
                return Err(TcClientError::NonUtf8Response);
            }
            // Nothing waiting within the timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Nothing was received so no response is owed
            Err(e) => return Err(TcClientError::RecvError(e)),
        };

        match Tc::from_json(&tc_str) {
            Ok(tc) => Ok(Some(tc)),
            Err(e) => {
                self.send_response(TcResponse::Invalid).ok();
                Err(TcClientError::TcParseError(e))
            }
        }
    }

    /// Send `response` to the ground server, answering the last received TC.
    pub fn send_response(&self, response: TcResponse) -> Result<(), TcClientError> {
        if !self.socket.connected() {
            return Err(TcClientError::NotConnected);
        }

        let response_str =
            serde_json::to_string(&response).map_err(TcClientError::SerializationError)?;

        self.socket
            .send(&response_str, 0)
            .map_err(TcClientError::SendError)
    }
}
