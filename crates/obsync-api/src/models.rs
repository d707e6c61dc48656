// ── Wire models ──
//
// Typed views of the obs-websocket v4 replies and events the mirror
// reads. Field names follow the server's JSON exactly; `obsync-core`
// converts these into its own domain types.

use serde::{Deserialize, Serialize};

/// Any `{ "name": ... }` list entry (scenes, sources).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedItem {
    pub name: String,
}

/// Reply to `GetSceneList`.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneListReply {
    #[serde(rename = "current-scene", default)]
    pub current_scene: Option<String>,
    pub scenes: Vec<NamedItem>,
}

/// Reply to `GetSourcesList`.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesListReply {
    pub sources: Vec<NamedItem>,
}

/// Reply to `GetCurrentScene` and `GetPreviewScene`.
///
/// Both fields are optional on purpose: some server builds answer with
/// neither (obs-websocket issue #346), which must not be mistaken for an
/// empty scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneReply {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<SceneItem>>,
}

/// Reply to `GetStudioModeStatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct StudioModeStatusReply {
    #[serde(rename = "studio-mode")]
    pub studio_mode: bool,
}

/// Payload of the `PreviewSceneChanged` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewSceneChangedEvent {
    #[serde(rename = "scene-name")]
    pub scene_name: String,
    #[serde(default)]
    pub sources: Vec<SceneItem>,
}

/// Payload of the `StudioModeSwitched` event.
#[derive(Debug, Clone, Deserialize)]
pub struct StudioModeSwitchedEvent {
    #[serde(rename = "new-state")]
    pub new_state: bool,
}

/// A scene item as OBS reports it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub x: f64,
    pub y: f64,
    pub cx: f64,
    pub cy: f64,
    pub source_cx: f64,
    pub source_cy: f64,
    pub render: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub alignment: Option<i64>,
    #[serde(default)]
    pub muted: Option<bool>,
    #[serde(rename = "parentGroupName", default)]
    pub parent_group_name: Option<String>,
    #[serde(rename = "groupChildren", default)]
    pub group_children: Option<Vec<SceneItem>>,
}

fn default_volume() -> f64 {
    1.0
}
