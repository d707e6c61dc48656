// ── Control transport seam ──
//
// The mirror only ever talks to OBS through this trait: send a named
// request with a JSON payload, receive named events with a JSON payload.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Error;
use crate::protocol::UpdateEvent;

/// Where and how to open the control socket.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `host:port`, without a scheme.
    pub address: String,
    /// Server password, if authentication is enabled on the OBS side.
    pub password: Option<SecretString>,
    /// Use `wss://` instead of `ws://`.
    pub secure: bool,
}

/// Transport tuning.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// How long to wait for the reply to a single request.
    pub request_timeout: Duration,
    /// Capacity of the pushed-event broadcast channel.
    pub event_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            event_capacity: 1024,
        }
    }
}

/// Everything the transport pushes to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Socket open and authenticated.
    ConnectionOpened,
    /// The socket ended, whether requested or not. Emitted once per
    /// successfully opened connection.
    ConnectionClosed,
    /// A socket-level error the transport could not attribute to a request.
    Error(String),
    /// A pushed `update-type` event.
    Update(UpdateEvent),
}

/// Black-box control channel to an OBS instance.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Open the socket and authenticate.
    async fn connect(&self, options: ConnectOptions) -> Result<(), Error>;

    /// Close the socket. Subscribers see [`TransportEvent::ConnectionClosed`]
    /// if a connection was open.
    async fn disconnect(&self);

    /// Issue `request_type` with `args` (an object or `null`) and await
    /// the reply body.
    async fn send(&self, request_type: &str, args: Value) -> Result<Value, Error>;

    /// `true` only while the socket is live.
    fn is_connected(&self) -> bool;

    /// Subscribe to pushed events.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}
