//! Command dispatch: bridges CLI args -> bridge Commands -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod watch;

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::debug;

use obsync_api::{ControlTransport, TransportConfig, WebSocketTransport};
use obsync_core::{Bridge, Command as BridgeCommand, ConnectionStatus, Hooks};

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch an OBS-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, target: Target, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Watch => watch::handle(target, global).await,
        Command::Transition(args) => control::transition(target, args, global).await,
        Command::Preview { scene } => control::preview(target, scene, global).await,
        Command::Stream(args) => control::stream(target, args, global).await,
        Command::Scenes => control::scenes(target, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "not an OBS command".into(),
        }),
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Start a bridge for `target` and make sure it is connected.
///
/// A bridge that resumed a persisted session to the same address is
/// reused as-is; one pointing elsewhere is disconnected first.
pub async fn open_session(target: &Target) -> Result<Bridge, CliError> {
    let transport: Arc<dyn ControlTransport> =
        Arc::new(WebSocketTransport::new(TransportConfig {
            request_timeout: target.bridge.policy.request_timeout,
            ..TransportConfig::default()
        }));
    let bridge = Bridge::new(transport, target.bridge.clone(), Hooks::default())?;
    bridge.start().await;

    if bridge.status() == ConnectionStatus::Connected {
        let current = bridge.store().websocket.get();
        if current.host == target.host && current.port == target.port {
            debug!(address = %current.address(), "reusing resumed session");
            return Ok(bridge);
        }
        bridge.execute(BridgeCommand::Disconnect).await?;
    }

    bridge
        .store()
        .websocket
        .update(|cfg| cfg.secure = target.secure)?;
    debug!(address = %target.address(), profile = %target.profile_name, "connecting");
    let connected = bridge
        .execute(BridgeCommand::Connect {
            host: target.host.clone(),
            port: target.port,
            password: target
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_owned())
                .unwrap_or_default(),
        })
        .await;
    if let Err(e) = connected {
        bridge.shutdown().await;
        return Err(e.into());
    }
    Ok(bridge)
}

/// Disconnect and stop the bridge, leaving `disconnected` persisted.
pub async fn close_session(bridge: &Bridge) {
    if let Err(e) = bridge.execute(BridgeCommand::Disconnect).await {
        debug!(error = %e, "disconnect on close");
    }
    bridge.shutdown().await;
}
