use serde::Deserialize;
use thiserror::Error;

use crate::protocol::STUDIO_MODE_NOT_ENABLED;

/// Top-level error type for the `obsync-api` crate.
///
/// Covers every failure mode of the control channel: socket setup,
/// authentication, request/reply correlation, and server-side rejections.
/// `obsync-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// WebSocket handshake or TCP connect failed.
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    /// The `host:port` pair could not be turned into a WebSocket URL.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A request was issued with no open socket.
    #[error("Not connected")]
    NotConnected,

    /// The socket went away while a reply was still outstanding.
    #[error("Connection closed before a reply was received")]
    Closed,

    /// No reply arrived within the configured request timeout.
    #[error("Request {request_type} timed out after {timeout_ms}ms")]
    Timeout {
        request_type: String,
        timeout_ms: u64,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// The server demanded auth and rejected (or was not given) a password.
    #[error("Authentication failed: {0}")]
    Auth(String),

    // ── Requests ────────────────────────────────────────────────────
    /// The server replied with `status: "error"`.
    #[error("Request failed: {0}")]
    Request(RequestError),

    // ── Data ────────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error reply from the server (`{"status": "error", "error": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Error, Deserialize)]
#[error("{error}")]
pub struct RequestError {
    #[serde(rename = "message-id", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: String,
}

impl Error {
    /// The server's error reply, if this is one.
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` for the preview-scene rejection OBS sends while
    /// studio mode is off.
    pub fn is_studio_mode_disabled(&self) -> bool {
        self.request_error()
            .is_some_and(|e| e.error == STUDIO_MODE_NOT_ENABLED)
    }

    /// Returns `true` if the socket is gone and a reconnect might help.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::NotConnected | Self::Closed | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn studio_mode_rejection_is_recognised() {
        let err = Error::Request(RequestError {
            message_id: Some("7".into()),
            status: "error".into(),
            error: STUDIO_MODE_NOT_ENABLED.into(),
        });
        assert!(err.is_studio_mode_disabled());
        assert!(!err.is_transient());
    }

    #[test]
    fn other_rejections_are_not_studio_mode() {
        let err = Error::Request(RequestError {
            message_id: None,
            status: "error".into(),
            error: "requested scene does not exist".into(),
        });
        assert!(!err.is_studio_mode_disabled());
        assert!(!Error::Closed.is_studio_mode_disabled());
        assert!(Error::Closed.is_transient());
    }
}
