//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use obsync_config::ConfigError;
use obsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to OBS at {address}")]
    #[diagnostic(
        code(obsync::connection_failed),
        help(
            "Check that OBS is running with the obs-websocket plugin enabled.\n\
             Address: {address}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(obsync::auth_failed),
        help(
            "Verify the obs-websocket password.\n\
             Pass it with --password, OBSYNC_PASSWORD, or password_env in your profile."
        )
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(code(obsync::connection_state))]
    ConnectionState { message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("OBS rejected {request_type}: {message}")]
    #[diagnostic(code(obsync::rejected))]
    Rejected {
        request_type: String,
        message: String,
    },

    #[error("Studio mode is not enabled in OBS")]
    #[diagnostic(
        code(obsync::studio_mode),
        help("Enable studio mode in OBS, or transition directly with: obsync transition --scene <name>")
    )]
    StudioModeDisabled,

    #[error("{0}")]
    #[diagnostic(code(obsync::bridge))]
    Bridge(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(obsync::validation))]
    Validation { field: String, reason: String },

    #[error("A target scene is required when studio mode is off")]
    #[diagnostic(
        code(obsync::missing_scene),
        help("Pass --scene <name>. List scenes with: obsync scenes")
    )]
    MissingScene,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(obsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: obsync config init --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Profile '{name}' already exists")]
    #[diagnostic(code(obsync::conflict), help("Use --force to overwrite it."))]
    ProfileExists { name: String },

    #[error(transparent)]
    #[diagnostic(code(obsync::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot encode output: {0}")]
    #[diagnostic(code(obsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ConnectionState { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::ProfileExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::MissingScene | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => Self::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_studio_mode_disabled() {
            return Self::StudioModeDisabled;
        }
        match err {
            CoreError::ConnectionFailed { address, reason } => {
                Self::ConnectionFailed { address, reason }
            }
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::MissingScene => Self::MissingScene,
            CoreError::Rejected {
                request_type,
                message,
                ..
            } => Self::Rejected {
                request_type,
                message,
            },
            CoreError::Validation { cell, reason } => Self::Validation {
                field: cell,
                reason,
            },
            precondition if precondition.is_precondition() => Self::ConnectionState {
                message: precondition.to_string(),
            },
            other => Self::Bridge(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let err = CliError::from(CoreError::ConnectionFailed {
            address: "localhost:4444".into(),
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err = CliError::from(CoreError::AlreadyConnected);
        assert_eq!(err.to_string(), "Already connected! Cannot connect again.");
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err = CliError::from(CoreError::MissingScene);
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn studio_mode_rejection_gets_its_own_diagnostic() {
        let err = CliError::from(CoreError::Rejected {
            request_type: "SetPreviewScene".into(),
            message: obsync_api::STUDIO_MODE_NOT_ENABLED.into(),
            message_id: None,
        });
        assert!(matches!(err, CliError::StudioModeDisabled));
    }

    #[test]
    fn missing_profile_lists_alternatives() {
        let err = CliError::from(ConfigError::ProfileNotFound {
            name: "studio".into(),
            available: vec![],
        });
        match err {
            CliError::ProfileNotFound { available, .. } => assert_eq!(available, "(none)"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
