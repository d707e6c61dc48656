// ── State synchronizer ──
//
// Pulls remote state into the cells on connect, and applies pushed
// events incrementally afterwards. Query failures are logged and
// swallowed; each query writes only its own cell.

use obsync_api::UpdateEvent;
use obsync_api::models::{
    PreviewSceneChangedEvent, SceneListReply, SceneReply, SourcesListReply,
    StudioModeStatusReply, StudioModeSwitchedEvent,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use super::Bridge;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Scene, TransitioningNotice};

/// A pushed event the synchronizer acts on.
#[derive(Debug)]
enum PushEvent {
    SwitchScenes,
    ScenesChanged,
    SourceCreated,
    SourceDestroyed,
    SourceRenamed,
    PreviewSceneChanged(PreviewSceneChangedEvent),
    TransitionBegin(Map<String, Value>),
    StudioModeSwitched(StudioModeSwitchedEvent),
    Other,
}

impl PushEvent {
    fn parse(update: UpdateEvent) -> Result<Self, serde_json::Error> {
        let UpdateEvent {
            update_type,
            fields,
        } = update;
        Ok(match update_type.as_str() {
            "SwitchScenes" => Self::SwitchScenes,
            "ScenesChanged" => Self::ScenesChanged,
            "SourceCreated" => Self::SourceCreated,
            "SourceDestroyed" => Self::SourceDestroyed,
            "SourceRenamed" => Self::SourceRenamed,
            "PreviewSceneChanged" => {
                Self::PreviewSceneChanged(serde_json::from_value(Value::Object(fields))?)
            }
            "TransitionBegin" => Self::TransitionBegin(fields),
            "StudioModeSwitched" => {
                Self::StudioModeSwitched(serde_json::from_value(Value::Object(fields))?)
            }
            _ => Self::Other,
        })
    }
}

impl Bridge {
    // ── Full pull ────────────────────────────────────────────────────

    /// Query every piece of mirrored state concurrently.
    ///
    /// Each query is independent: one failing does not stop the others.
    pub async fn full_pull(&self) {
        tokio::join!(
            self.update_scene_list(),
            self.update_source_list(),
            self.update_program_scene(),
            self.update_preview_scene(),
            self.update_studio_mode(),
        );
        self.inner.store.mark_full_pull();
        debug!(
            scenes = self.inner.store.scene_list.with(Vec::len),
            sources = self.inner.store.source_list.with(Vec::len),
            "full pull complete"
        );
    }

    async fn update_scene_list(&self) {
        match self.query::<SceneListReply>("GetSceneList").await {
            Ok(reply) => {
                let _ = self.inner.store.scene_list.set(convert::scene_names(reply));
            }
            Err(e) => error!(error = %e, "Error updating scenes list"),
        }
    }

    async fn update_source_list(&self) {
        match self.query::<SourcesListReply>("GetSourcesList").await {
            Ok(reply) => {
                let _ = self
                    .inner
                    .store
                    .source_list
                    .set(convert::source_names(reply));
            }
            Err(e) => error!(error = %e, "Error updating sources list"),
        }
    }

    async fn update_program_scene(&self) {
        match self.query::<SceneReply>("GetCurrentScene").await {
            Ok(reply) => match convert::scene_from_reply(reply) {
                Some(scene) => {
                    let _ = self.inner.store.program_scene.set(Some(scene));
                }
                None => debug!("GetCurrentScene reply incomplete, keeping program scene"),
            },
            Err(e) => error!(error = %e, "Error updating program scene"),
        }
    }

    async fn update_preview_scene(&self) {
        match self.query::<SceneReply>("GetPreviewScene").await {
            Ok(reply) => match convert::scene_from_reply(reply) {
                Some(scene) => {
                    let _ = self.inner.store.preview_scene.set(Some(scene));
                }
                None => debug!("GetPreviewScene reply incomplete, keeping preview scene"),
            },
            Err(e) if e.is_studio_mode_disabled() => {
                debug!("studio mode disabled, clearing preview scene");
                let _ = self.inner.store.preview_scene.set(None);
            }
            Err(e) => error!(error = %e, "Error updating preview scene"),
        }
    }

    async fn update_studio_mode(&self) {
        match self.query::<StudioModeStatusReply>("GetStudioModeStatus").await {
            Ok(reply) => {
                let _ = self.inner.store.studio_mode.set(reply.studio_mode);
            }
            Err(e) => error!(error = %e, "Error getting studio mode status"),
        }
    }

    // ── Pushed events ────────────────────────────────────────────────

    pub(super) async fn apply_update(&self, update: UpdateEvent) {
        let update_type = update.update_type.clone();
        let event = match PushEvent::parse(update) {
            Ok(event) => event,
            Err(e) => {
                warn!(update_type = %update_type, error = %e, "malformed event payload");
                return;
            }
        };
        trace!(update_type = %update_type, "applying pushed event");

        let store = &self.inner.store;
        match event {
            PushEvent::SwitchScenes => {
                let _ = store.transitioning.set(false);
                tokio::join!(self.update_preview_scene(), self.update_program_scene());
            }
            PushEvent::ScenesChanged => self.update_scene_list().await,
            PushEvent::SourceCreated | PushEvent::SourceDestroyed | PushEvent::SourceRenamed => {
                self.update_source_list().await;
            }
            PushEvent::PreviewSceneChanged(payload) => {
                let _ = store.preview_scene.set(Some(Scene::from(payload)));
            }
            PushEvent::TransitionBegin(fields) => {
                let to_scene = store
                    .preview_scene
                    .with(|scene| scene.as_ref().map(|s| s.name.clone()));
                let from_scene = store
                    .program_scene
                    .with(|scene| scene.as_ref().map(|s| s.name.clone()));
                let notice = TransitioningNotice {
                    scene_name: to_scene.clone(),
                    from_scene,
                    to_scene,
                    fields,
                };
                // No subscribers is fine.
                let _ = self.inner.notices.send(notice);
                let _ = store.transitioning.set(true);
            }
            PushEvent::StudioModeSwitched(payload) => {
                let _ = store.studio_mode.set(payload.new_state);
            }
            PushEvent::Other => {}
        }
    }

    // ── Remote calls ─────────────────────────────────────────────────

    /// Issue a request, attributing any failure to `request_type`.
    pub(super) async fn send(&self, request_type: &str, args: Value) -> Result<Value, CoreError> {
        self.inner
            .transport
            .send(request_type, args)
            .await
            .map_err(|e| CoreError::from_request(request_type, e))
    }

    async fn query<T: DeserializeOwned>(&self, request_type: &str) -> Result<T, CoreError> {
        let reply = self.send(request_type, Value::Null).await?;
        serde_json::from_value(reply).map_err(|e| CoreError::MalformedResponse {
            request_type: request_type.to_owned(),
            message: e.to_string(),
        })
    }
}
