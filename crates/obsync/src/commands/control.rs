//! One-shot control commands: connect, act, print, disconnect.

use serde::Serialize;

use obsync_core::{Bridge, Command as BridgeCommand, CommandResult, TransitionRequest};

use super::{close_session, open_session};
use crate::cli::{GlobalOpts, StreamArgs, StreamCommand, TransitionArgs};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

/// Run `command` on a fresh session and report the outcome.
async fn run_once(
    target: &Target,
    command: BridgeCommand,
    done: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge = open_session(target).await?;
    let result = bridge.execute(command).await;
    close_session(&bridge).await;

    if matches!(result?, CommandResult::Ok) && !global.quiet {
        eprintln!("✓ {done}");
    }
    Ok(())
}

pub async fn transition(
    target: Target,
    args: TransitionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let done = match args.scene.as_deref() {
        Some(scene) => format!("Transitioned to '{scene}'"),
        None => "Transitioned preview to program".into(),
    };
    let request = TransitionRequest {
        name: args.name,
        duration: args.duration,
        scene_name: args.scene,
    };
    run_once(&target, BridgeCommand::Transition(request), &done, global).await
}

pub async fn preview(target: Target, scene: String, global: &GlobalOpts) -> Result<(), CliError> {
    let done = format!("Preview set to '{scene}'");
    run_once(
        &target,
        BridgeCommand::SetPreviewScene { scene_name: scene },
        &done,
        global,
    )
    .await
}

pub async fn stream(target: Target, args: StreamArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (command, done) = match args.command {
        StreamCommand::Start => (BridgeCommand::StartStreaming, "Streaming started"),
        StreamCommand::Stop => (BridgeCommand::StopStreaming, "Streaming stopped"),
    };
    run_once(&target, command, done, global).await
}

// ── Scenes ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SceneOverview {
    address: String,
    studio_mode: bool,
    program: Option<String>,
    preview: Option<String>,
    scenes: Vec<String>,
    sources: Vec<String>,
}

impl SceneOverview {
    fn capture(bridge: &Bridge) -> Self {
        let store = bridge.store();
        let name = |scene: &Option<obsync_core::Scene>| scene.as_ref().map(|s| s.name.clone());
        Self {
            address: store.websocket.with(obsync_core::WebsocketConfig::address),
            studio_mode: store.studio_mode(),
            program: store.program_scene.with(name),
            preview: store.preview_scene.with(name),
            scenes: store.scene_list.get(),
            sources: store.source_list.get(),
        }
    }

    fn plain(&self) -> String {
        let mut lines = vec![format!(
            "OBS at {} (studio mode {})",
            self.address,
            if self.studio_mode { "on" } else { "off" }
        )];
        for scene in &self.scenes {
            let mut marks = Vec::new();
            if self.program.as_ref() == Some(scene) {
                marks.push("program");
            }
            if self.preview.as_ref() == Some(scene) {
                marks.push("preview");
            }
            if marks.is_empty() {
                lines.push(format!("  {scene}"));
            } else {
                lines.push(format!("  {scene}  [{}]", marks.join(", ")));
            }
        }
        lines.push(format!("{} sources", self.sources.len()));
        lines.join("\n")
    }
}

pub async fn scenes(target: Target, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = open_session(&target).await?;
    let overview = SceneOverview::capture(&bridge);
    close_session(&bridge).await;

    let out = output::render(global.output, &overview, SceneOverview::plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
