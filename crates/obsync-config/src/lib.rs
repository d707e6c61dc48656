//! Shared configuration for obsync.
//!
//! TOML profiles, password resolution (env var + plaintext), and
//! translation to `obsync_core::BridgeConfig`. The CLI layers its
//! `GlobalOpts` flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use obsync_core::{BridgeConfig, ConnectionPolicy, DEFAULT_NAMESPACE};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named OBS profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, listing the configured profiles on failure.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Configured profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Values a profile falls back to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Root for persisted connection state.
    pub state_dir: Option<PathBuf>,

    #[serde(default = "default_reconnect_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_liveness_ms")]
    pub liveness_interval_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            state_dir: None,
            reconnect_interval_ms: default_reconnect_ms(),
            liveness_interval_ms: default_liveness_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_reconnect_ms() -> u64 {
    5_000
}
fn default_liveness_ms() -> u64 {
    1_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

/// A named OBS instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Server password (plaintext -- prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the server password.
    pub password_env: Option<String>,

    /// Connect with `wss://`.
    #[serde(default)]
    pub secure: bool,

    /// State namespace; defaults to `obs`.
    pub namespace: Option<String>,

    /// Overrides `defaults.state_dir`.
    pub state_dir: Option<PathBuf>,

    pub reconnect_interval_ms: Option<u64>,
    pub liveness_interval_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            password_env: None,
            secure: false,
            namespace: None,
            state_dir: None,
            reconnect_interval_ms: None,
            liveness_interval_ms: None,
            request_timeout_ms: None,
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    4444
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "obsync", "obsync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where connection state is persisted when no `state_dir` is configured.
pub fn default_state_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("state"),
        |dirs| dirs.data_dir().join("state"),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("obsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `OBSYNC_`-prefixed variables override file values; nested keys use
/// `__` (e.g. `OBSYNC_DEFAULTS__REQUEST_TIMEOUT_MS`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OBSYNC_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

/// Resolve the server password: `password_env` first, then plaintext.
pub fn resolve_password(profile: &Profile) -> Option<SecretString> {
    resolve_password_with(profile, |name| std::env::var(name).ok())
}

/// [`resolve_password`] with an injectable environment lookup.
pub fn resolve_password_with(
    profile: &Profile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Some(val) = lookup(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. Plaintext in config
    profile
        .password
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(|p| SecretString::from(p.clone()))
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `BridgeConfig` from a profile and the global defaults.
pub fn profile_to_bridge_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<BridgeConfig, ConfigError> {
    validate_endpoint(profile)?;

    let namespace = profile
        .namespace
        .clone()
        .unwrap_or_else(|| DEFAULT_NAMESPACE.into());
    if namespace.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "namespace".into(),
            reason: "must not be empty".into(),
        });
    }

    let policy = ConnectionPolicy {
        reconnect_interval: interval(
            "reconnect_interval_ms",
            profile
                .reconnect_interval_ms
                .unwrap_or(defaults.reconnect_interval_ms),
        )?,
        liveness_interval: interval(
            "liveness_interval_ms",
            profile
                .liveness_interval_ms
                .unwrap_or(defaults.liveness_interval_ms),
        )?,
        request_timeout: interval(
            "request_timeout_ms",
            profile
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
        )?,
    };

    let state_dir = profile
        .state_dir
        .clone()
        .or_else(|| defaults.state_dir.clone())
        .unwrap_or_else(default_state_dir);

    Ok(BridgeConfig::new(namespace)
        .with_state_dir(state_dir)
        .with_policy(policy))
}

/// Reject a profile that cannot address an OBS instance.
pub fn validate_endpoint(profile: &Profile) -> Result<(), ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }
    Ok(())
}

fn interval(field: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}
