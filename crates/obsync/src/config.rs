//! CLI configuration: a thin wrapper around `obsync_config`.
//!
//! Adds the `GlobalOpts` flag overrides (--host, --port, --password,
//! --namespace) on top of the resolved profile.

use secrecy::SecretString;

use obsync_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use obsync_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Everything needed to open a session: where OBS is, and how the bridge
/// should behave.
pub struct Target {
    pub profile_name: String,
    pub host: String,
    pub port: u16,
    pub password: Option<SecretString>,
    pub secure: bool,
    pub bridge: BridgeConfig,
}

impl Target {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply the global flags to a profile. Flag values win.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
        profile.password_env = None;
    }
    if let Some(ref namespace) = global.namespace {
        profile.namespace = Some(namespace.clone());
    }
}

/// Build the session target from the config file, profile, and CLI overrides.
///
/// An explicitly requested profile must exist; otherwise a missing
/// profile falls back to defaults plus flags.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profile(&profile_name) {
        Ok(profile) => profile.clone(),
        Err(e) if global.profile.is_some() => return Err(e.into()),
        Err(_) => Profile::default(),
    };
    apply_overrides(&mut profile, global);

    let bridge = obsync_config::profile_to_bridge_config(&profile, &cfg.defaults)?;
    Ok(Target {
        password: obsync_config::resolve_password(&profile),
        host: profile.host,
        port: profile.port,
        secure: profile.secure,
        profile_name,
        bridge,
    })
}
