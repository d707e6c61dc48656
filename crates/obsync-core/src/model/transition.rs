// ── Transition types ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which transition to run and for how long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// Transition name; `None` uses whatever OBS has selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Duration in milliseconds; `None` uses the OBS default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// Arguments of `TransitionToProgram`, and the value a pre-transition
/// hook sees and may replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOptions {
    #[serde(rename = "with-transition")]
    pub with_transition: TransitionSpec,
}

impl TransitionOptions {
    pub fn new(name: Option<String>, duration: Option<u64>) -> Self {
        Self {
            with_transition: TransitionSpec { name, duration },
        }
    }
}

/// Outbound notification sent once per `TransitionBegin` event.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitioningNotice {
    /// Scene being transitioned to (the preview scene at event time).
    pub scene_name: Option<String>,
    /// Program scene at event time.
    pub from_scene: Option<String>,
    /// Same as `scene_name`.
    pub to_scene: Option<String>,
    /// Every field the event itself carried.
    pub fields: Map<String, Value>,
}

impl TransitioningNotice {
    /// Flatten into one JSON object. Event fields win over the computed
    /// scene names when keys collide.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("sceneName".into(), opt_string(self.scene_name.as_ref()));
        out.insert("fromScene".into(), opt_string(self.from_scene.as_ref()));
        out.insert("toScene".into(), opt_string(self.to_scene.as_ref()));
        for (key, value) in &self.fields {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

fn opt_string(s: Option<&String>) -> Value {
    s.map_or(Value::Null, |s| Value::String(s.clone()))
}
