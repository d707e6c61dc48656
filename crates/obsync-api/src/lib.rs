//! Async client for the obs-websocket remote control protocol.
//!
//! - **[`ControlTransport`]**: the seam consumers depend on: connect,
//!   disconnect, send a named request and await its reply, and subscribe
//!   to pushed update events.
//!
//! - **[`WebSocketTransport`]**: the tokio-tungstenite implementation,
//!   speaking the v4 JSON dialect (`request-type` / `message-id` /
//!   `update-type` frames) including the challenge/salt auth handshake.
//!
//! - **[`models`]**: typed views of the replies and events the mirror
//!   consumes.

pub mod error;
pub mod models;
pub mod protocol;
pub mod transport;
pub mod websocket;

pub use error::{Error, RequestError};
pub use protocol::{STUDIO_MODE_NOT_ENABLED, UpdateEvent};
pub use transport::{ConnectOptions, ControlTransport, TransportConfig, TransportEvent};
pub use websocket::WebSocketTransport;
