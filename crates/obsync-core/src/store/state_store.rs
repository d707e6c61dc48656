// ── Per-namespace state store ──
//
// The seven cells one bridge instance exposes. Only `websocket` is
// persisted; everything else starts empty and is repopulated from OBS.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::cell::StateCell;
use crate::model::{
    ConnectionStatus, PreviewScene, ProgramScene, SceneList, SourceList, WebsocketConfig,
};

/// File name of the persisted connection config, inside the namespace dir.
pub const WEBSOCKET_FILE: &str = "websocket.json";

/// All state cells of one namespace.
pub struct StateStore {
    namespace: String,
    pub websocket: StateCell<WebsocketConfig>,
    pub program_scene: StateCell<ProgramScene>,
    pub preview_scene: StateCell<PreviewScene>,
    pub scene_list: StateCell<SceneList>,
    pub source_list: StateCell<SourceList>,
    pub transitioning: StateCell<bool>,
    pub studio_mode: StateCell<bool>,
    last_full_pull: watch::Sender<Option<DateTime<Utc>>>,
}

impl StateStore {
    /// Build the cells for `namespace`. With a `state_dir`, the websocket
    /// cell is loaded from and saved to `<state_dir>/<namespace>/websocket.json`.
    pub fn new(namespace: &str, state_dir: Option<&Path>) -> Self {
        let cell_name = |suffix: &str| format!("{namespace}:{suffix}");

        let websocket = match state_dir {
            Some(dir) => StateCell::persistent(
                cell_name("websocket"),
                dir.join(namespace).join(WEBSOCKET_FILE),
                WebsocketConfig::default(),
            ),
            None => StateCell::new(cell_name("websocket"), WebsocketConfig::default()),
        };
        let (last_full_pull, _) = watch::channel(None);

        Self {
            namespace: namespace.to_owned(),
            websocket,
            program_scene: StateCell::new(cell_name("programScene"), None),
            preview_scene: StateCell::new(cell_name("previewScene"), None),
            scene_list: StateCell::new(cell_name("sceneList"), Vec::new()),
            source_list: StateCell::new(cell_name("sourceList"), Vec::new()),
            transitioning: StateCell::new(cell_name("transitioning"), false),
            studio_mode: StateCell::new(cell_name("studioMode"), false),
            last_full_pull,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.websocket.with(|cfg| cfg.status)
    }

    pub fn studio_mode(&self) -> bool {
        self.studio_mode.get()
    }

    pub fn transitioning(&self) -> bool {
        self.transitioning.get()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When the last full pull finished, if ever.
    pub fn last_full_pull(&self) -> Option<DateTime<Utc>> {
        *self.last_full_pull.borrow()
    }

    pub fn subscribe_full_pull(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_full_pull.subscribe()
    }

    pub(crate) fn mark_full_pull(&self) {
        let _ = self.last_full_pull.send(Some(Utc::now()));
    }
}


impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
