// ── Connection configuration ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of the control connection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// `true` for the statuses that restart recovery resumes from.
    pub fn was_active(self) -> bool {
        matches!(self, Self::Connected | Self::Connecting)
    }
}

/// Where to reach OBS, plus the current connection status.
///
/// The only persisted cell. `host` is also read from the legacy `ip` key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsocketConfig {
    #[serde(alias = "ip")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub status: ConnectionStatus,
}

impl WebsocketConfig {
    /// `host:port`, as the transport expects it.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 4444,
            password: String::new(),
            secure: false,
            status: ConnectionStatus::Disconnected,
        }
    }
}

impl fmt::Debug for WebsocketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebsocketConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "[REDACTED]" })
            .field("secure", &self.secure)
            .field("status", &self.status)
            .finish()
    }
}
