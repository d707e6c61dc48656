//! Config subcommand handlers.

use std::fmt::Write;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with every plaintext password masked.
fn redacted(cfg: &Config) -> Config {
    let mut out = cfg.clone();
    for profile in out.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    out
}

fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    if let Some(ref dir) = cfg.defaults.state_dir {
        let _ = writeln!(out, "state_dir = \"{}\"", dir.display());
    }
    let _ = writeln!(
        out,
        "reconnect_interval_ms = {}",
        cfg.defaults.reconnect_interval_ms
    );
    let _ = writeln!(
        out,
        "liveness_interval_ms = {}",
        cfg.defaults.liveness_interval_ms
    );
    let _ = writeln!(out, "request_timeout_ms = {}", cfg.defaults.request_timeout_ms);

    for name in cfg.profile_names() {
        let p = &cfg.profiles[&name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if let Some(ref password) = p.password {
            let _ = writeln!(out, "password = \"{password}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if p.secure {
            let _ = writeln!(out, "secure = true");
        }
        if let Some(ref ns) = p.namespace {
            let _ = writeln!(out, "namespace = \"{ns}\"");
        }
        if let Some(ref dir) = p.state_dir {
            let _ = writeln!(out, "state_dir = \"{}\"", dir.display());
        }
        for (key, value) in [
            ("reconnect_interval_ms", p.reconnect_interval_ms),
            ("liveness_interval_ms", p.liveness_interval_ms),
            ("request_timeout_ms", p.request_timeout_ms),
        ] {
            if let Some(ms) = value {
                let _ = writeln!(out, "{key} = {ms}");
            }
        }
    }
    out.trim_end().to_owned()
}

/// Build the profile `config init` writes, from the global flags.
fn init_profile(global: &GlobalOpts, password_env: Option<String>, secure: bool) -> Profile {
    let mut profile = Profile {
        secure,
        ..Profile::default()
    };
    config::apply_overrides(&mut profile, global);
    if password_env.is_some() {
        profile.password = None;
        profile.password_env = password_env;
    }
    profile
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render(global.output, &cfg, format_config)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            force,
            password_env,
            secure,
        } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            if cfg.profiles.contains_key(&profile_name) && !force {
                return Err(CliError::ProfileExists { name: profile_name });
            }

            let profile = init_profile(global, password_env, secure);
            let address = format!("{}:{}", profile.host, profile.port);
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Profile '{profile_name}' ({address}) written to {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use pretty_assertions::assert_eq;

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            host: None,
            port: None,
            password: None,
            namespace: None,
            output: OutputFormat::Plain,
            verbose: 0,
            log_json: false,
            quiet: false,
        }
    }

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "studio".into(),
            Profile {
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let text = format_config(&redacted(&cfg));
        assert!(text.contains("[profiles.studio]"));
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn init_prefers_password_env_over_flag() {
        let opts = GlobalOpts {
            host: Some("obs.lan".into()),
            password: Some("pw".into()),
            ..global()
        };
        let profile = init_profile(&opts, Some("OBS_PASSWORD".into()), true);
        assert_eq!(profile.host, "obs.lan");
        assert_eq!(profile.password, None);
        assert_eq!(profile.password_env.as_deref(), Some("OBS_PASSWORD"));
        assert!(profile.secure);
    }

    #[test]
    fn init_keeps_flag_password_without_env() {
        let opts = GlobalOpts {
            password: Some("pw".into()),
            ..global()
        };
        let profile = init_profile(&opts, None, false);
        assert_eq!(profile.password.as_deref(), Some("pw"));
        assert_eq!(profile.port, 4444);
    }
}
