// ── Core error types ──
//
// User-facing errors from obsync-core. Consumers never see raw socket
// failures or JSON parse errors directly; the `From<obsync_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Preconditions ────────────────────────────────────────────────
    #[error("Already connected! Cannot connect again.")]
    AlreadyConnected,

    #[error("Please wait! Connection already in progress!")]
    ConnectionInProgress,

    #[error("Already disconnected! Cannot disconnect.")]
    AlreadyDisconnected,

    #[error("Connection in progress! Please wait before disconnecting.")]
    DisconnectWhileConnecting,

    #[error("Can't transition when not connected to OBS")]
    NotConnected,

    #[error("A target scene is required when studio mode is off")]
    MissingScene,

    #[error("Namespace \"{namespace}\" has already been used. Please choose a different namespace.")]
    NamespaceInUse { namespace: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to OBS at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("{request_type} rejected by OBS: {message}")]
    Rejected {
        request_type: String,
        message: String,
        message_id: Option<String>,
    },

    #[error("Transition {} failed: {source}", describe_transition(.name.as_deref(), .duration.as_ref().copied()))]
    TransitionFailed {
        name: Option<String>,
        duration: Option<u64>,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Malformed {request_type} reply: {message}")]
    MalformedResponse {
        request_type: String,
        message: String,
    },

    // ── State store errors ───────────────────────────────────────────
    #[error("Rejected write to {cell}: {reason}")]
    Validation { cell: String, reason: String },

    #[error("Cannot persist {cell}: {reason}")]
    Persistence { cell: String, reason: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Bridge is not running")]
    BridgeStopped,
}

impl CoreError {
    /// Returns `true` for the preview-scene rejection OBS sends while
    /// studio mode is off.
    pub fn is_studio_mode_disabled(&self) -> bool {
        matches!(
            self,
            Self::Rejected { message, .. } if message == obsync_api::STUDIO_MODE_NOT_ENABLED
        )
    }

    /// Returns `true` for errors raised before any state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConnected
                | Self::ConnectionInProgress
                | Self::AlreadyDisconnected
                | Self::DisconnectWhileConnecting
                | Self::NotConnected
                | Self::MissingScene
                | Self::NamespaceInUse { .. }
        )
    }

    /// Attach the request type to a transport error from `send`.
    pub(crate) fn from_request(request_type: &str, err: obsync_api::Error) -> Self {
        match err {
            obsync_api::Error::Request(rejection) => Self::Rejected {
                request_type: request_type.to_owned(),
                message: rejection.error,
                message_id: rejection.message_id,
            },
            obsync_api::Error::Serialization(e) => Self::MalformedResponse {
                request_type: request_type.to_owned(),
                message: e.to_string(),
            },
            other => other.into(),
        }
    }
}

fn describe_transition(name: Option<&str>, duration: Option<u64>) -> String {
    match (name, duration) {
        (Some(name), Some(ms)) => format!("\"{name}\" ({ms}ms)"),
        (Some(name), None) => format!("\"{name}\""),
        (None, Some(ms)) => format!("(default, {ms}ms)"),
        (None, None) => "(default)".into(),
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<obsync_api::Error> for CoreError {
    fn from(err: obsync_api::Error) -> Self {
        match err {
            obsync_api::Error::Connect(reason) => CoreError::ConnectionFailed {
                address: String::new(),
                reason,
            },
            obsync_api::Error::InvalidAddress(address) => CoreError::ConnectionFailed {
                address,
                reason: "invalid address".into(),
            },
            obsync_api::Error::Auth(message) => CoreError::AuthenticationFailed { message },
            obsync_api::Error::Request(rejection) => CoreError::Rejected {
                request_type: "request".into(),
                message: rejection.error,
                message_id: rejection.message_id,
            },
            obsync_api::Error::Serialization(e) => CoreError::MalformedResponse {
                request_type: "request".into(),
                message: e.to_string(),
            },
            e @ (obsync_api::Error::NotConnected
            | obsync_api::Error::Closed
            | obsync_api::Error::Timeout { .. }) => CoreError::Transport {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsync_api::RequestError;

    fn rejection(text: &str) -> obsync_api::Error {
        obsync_api::Error::Request(RequestError {
            message_id: Some("12".into()),
            status: "error".into(),
            error: text.into(),
        })
    }

    #[test]
    fn precondition_messages_are_exact() {
        assert_eq!(
            CoreError::AlreadyConnected.to_string(),
            "Already connected! Cannot connect again."
        );
        assert_eq!(
            CoreError::NamespaceInUse {
                namespace: "obs".into()
            }
            .to_string(),
            "Namespace \"obs\" has already been used. Please choose a different namespace."
        );
    }

    #[test]
    fn request_errors_keep_request_type() {
        let err = CoreError::from_request("GetPreviewScene", rejection("studio mode not enabled"));
        assert!(err.is_studio_mode_disabled());
        assert!(matches!(
            err,
            CoreError::Rejected { ref request_type, .. } if request_type == "GetPreviewScene"
        ));
    }

    #[test]
    fn transition_failure_describes_attempt() {
        let err = CoreError::TransitionFailed {
            name: Some("Fade".into()),
            duration: Some(300),
            source: Box::new(CoreError::from_request(
                "TransitionToProgram",
                rejection("no transition"),
            )),
        };
        assert_eq!(
            err.to_string(),
            "Transition \"Fade\" (300ms) failed: TransitionToProgram rejected by OBS: no transition"
        );
    }

    #[test]
    fn socket_failures_map_to_transport() {
        let err: CoreError = obsync_api::Error::Closed.into();
        assert!(matches!(err, CoreError::Transport { .. }));
        assert!(!err.is_precondition());
    }
}
