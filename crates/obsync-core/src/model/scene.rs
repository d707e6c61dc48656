// ── Scene domain types ──

use serde::{Deserialize, Serialize};

/// Program scene cell value. `None` until the first successful pull.
pub type ProgramScene = Option<Scene>;

/// Preview scene cell value. `None` while studio mode is off or unknown.
pub type PreviewScene = Option<Scene>;

/// Scene names, in OBS order.
pub type SceneList = Vec<String>;

/// Source names, in OBS order.
pub type SourceList = Vec<String>;

/// A scene and the items placed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub sources: Vec<Source>,
}

impl Scene {
    pub fn new(name: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    /// Look up a top-level item by name.
    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// One item in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub position: Position,
    pub size: Size,
    pub source_size: Size,
    pub render: bool,
    pub locked: bool,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_children: Option<Vec<Source>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub cx: f64,
    pub cy: f64,
}
