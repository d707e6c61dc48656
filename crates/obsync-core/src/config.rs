// ── Runtime bridge configuration ──
//
// These types describe *how* a bridge behaves. They never touch disk;
// the CLI builds a `BridgeConfig` (via obsync-config) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use crate::namespace::DEFAULT_NAMESPACE;

/// Timing of the reconnection and liveness machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Delay between reconnection attempts.
    pub reconnect_interval: Duration,
    /// How often a `connected` status is checked against the transport.
    pub liveness_interval: Duration,
    /// Per-request reply timeout handed to the transport.
    pub request_timeout: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(5),
            liveness_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Scopes the state cells; unique per process.
    pub namespace: String,
    /// Root for persisted cells. `None` disables persistence.
    pub state_dir: Option<PathBuf>,
    pub policy: ConnectionPolicy,
}

impl BridgeConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.into(),
            state_dir: None,
            policy: ConnectionPolicy::default(),
        }
    }
}
