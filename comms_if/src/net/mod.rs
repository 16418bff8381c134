//! # Network layer
//!
//! Networking abstractions over ZMQ. All sockets used by the executables are
//! [`MonitoredSocket`]s, which track whether a peer is actually connected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    convert::TryInto,
    sync::{atomic::AtomicBool, atomic::AtomicUsize, atomic::Ordering, Arc},
    thread,
};

use log::debug;
use serde::{Deserialize, Serialize};
use zmq::{Context, Socket, SocketEvent, SocketType};

// Re-exported so consumers don't need their own zmq dependency
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! apply_opts {
    ($socket:expr, $(($setter:ident, $value:expr)),+ $(,)?) => {
        $(
            $socket
                .$setter($value)
                .map_err(|e| {
                    MonitoredSocketError::SocketOptionError(stringify!($setter).into(), e)
                })?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Counter used to give each monitor a unique inproc address.
static MONITOR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoints used by the software, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint over which telecommands are sent to the arm executable. The
    /// commanding side (such as the console) binds this endpoint and the arm
    /// executable's `TcClient` connects to it.
    pub tc_endpoint: String,

    /// Endpoint the motion executable's demand server binds to, and which the
    /// arm executable connects to in order to issue motion demands.
    pub motion_dems_endpoint: String,
}

/// A zmq socket with a background monitor attached.
///
/// The monitor thread watches connection events on the socket and keeps a flag raised while a
/// peer is connected, readable through [`MonitoredSocket::connected`]. Everything else derefs
/// straight to the inner [`zmq::Socket`].
pub struct MonitoredSocket {
    socket: Socket,

    connected: Arc<AtomicBool>,
}

/// Options applied to a [`MonitoredSocket`] when it is created.
///
/// Apart from `bind` and `block_on_first_connect` these map directly onto the options described
/// in the [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
pub struct SocketOptions {
    /// Bind to the endpoint rather than connect to it. Servers bind, clients connect.
    ///
    /// Defaults to `false`.
    pub bind: bool,

    /// Block inside `MonitoredSocket::new()` until the connection is up. If `connect_timeout`
    /// expires first the call fails with [`MonitoredSocketError::CouldNotConnect`].
    ///
    /// Defaults to `true`.
    pub block_on_first_connect: bool,

    /// `ZMQ_REQ_CORRELATE`: match replies with requests
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`: relax the strict request/reply alternation
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`: linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_RECONNECT_IVL_MAX`: maximum reconnection interval
    pub reconnect_ivl_max: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`: interval between ZMTP heartbeats
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`: timeout for ZMTP heartbeats
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`: time to live for ZMTP heartbeats
    pub heartbeat_ttl: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Could not create the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not enable monitoring on the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("The socket failed to connect: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read an event from the monitor: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not apply the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a socket of `socket_type` on `endpoint` and start monitoring it.
    ///
    /// The socket binds or connects according to `socket_options.bind`. With
    /// `block_on_first_connect` set this call waits until the connection is established, failing
    /// with [`MonitoredSocketError::CouldNotConnect`] if the connect timeout expires first.
    /// Servers normally bind without blocking, clients connect and may block.
    ///
    /// `endpoint` is a zmq endpoint string, such as `"tcp://localhost:4000"`.
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, MonitoredSocketError> {
        let socket = ctx
            .socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        socket_options.set(&socket)?;

        // Monitoring must be up before connect/bind or the first events are missed
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            MONITOR_COUNT.fetch_add(1, Ordering::Relaxed)
        );
        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;

        let monitor = ctx
            .socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        if socket_options.bind {
            socket.bind(endpoint)
        } else {
            socket.connect(endpoint)
        }
        .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        // Connection state flag shared with the monitor thread
        let connected = Arc::new(AtomicBool::new(false));

        // Clients which asked for it wait here until the monitor reports the connection
        if socket_options.block_on_first_connect {
            loop {
                match recv_event(&monitor).map_err(MonitoredSocketError::EventReadError)? {
                    SocketEvent::CONNECTED => break,
                    SocketEvent::CONNECT_DELAYED => continue,
                    _ => return Err(MonitoredSocketError::CouldNotConnect(None)),
                }
            }

            connected.store(true, Ordering::Relaxed);
        }

        // The monitor thread ends itself when the monitored socket closes, so
        // no join handle is kept
        let flag = connected.clone();
        thread::spawn(move || run_monitor(monitor, monitor_endpoint, flag));

        Ok(Self { socket, connected })
    }

    /// True if the socket currently has a live connection.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl SocketOptions {
    /// Apply these options to the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        apply_opts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_reconnect_ivl_max, self.reconnect_ivl_max),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout),
        );

        // REQ-only options are rejected by other socket types
        if let Ok(SocketType::REQ) = socket.get_socket_type() {
            apply_opts!(
                socket,
                (set_req_correlate, self.req_correlate),
                (set_req_relaxed, self.req_relaxed),
            );
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // zmq's own defaults, see http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            block_on_first_connect: true,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            reconnect_ivl_max: 0,
            recv_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            send_timeout: 0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read one event from a monitor socket.
///
/// Monitor events arrive as two message parts, the first holding the event number and value, the
/// second the endpoint address.
fn recv_event(socket: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = socket.recv_msg(0)?;

    let event = msg
        .get(0..2)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u16::from_ne_bytes)
        .ok_or(zmq::Error::EPROTO)?;

    if !socket.get_rcvmore()? {
        return Err(zmq::Error::EPROTO);
    }

    // Second part is the address, not needed
    let _ = socket.recv_msg(0)?;

    Ok(SocketEvent::from_raw(event))
}

/// Body of the monitor thread, tracks the connection state of one socket.
fn run_monitor(monitor: Socket, monitor_endpoint: String, connected: Arc<AtomicBool>) {
    loop {
        // An error reading means the context is being torn down and the thread can end
        let event = match recv_event(&monitor) {
            Ok(e) => e,
            Err(e) => {
                debug!("Monitor {} stopping: {}", monitor_endpoint, e);
                break;
            }
        };

        match event {
            SocketEvent::CONNECTED => connected.store(true, Ordering::Relaxed),
            SocketEvent::DISCONNECTED => connected.store(false, Ordering::Relaxed),
            // Sent when the monitored socket is closed, after which no more
            // events will arrive
            SocketEvent::MONITOR_STOPPED => break,
            _ => (),
        }
    }
}
