// ── Command orchestrator ──
//
// High-level operations composed of several OBS requests. `transitioning`
// is set before a transition is sent and is cleared by the `SwitchScenes`
// event, or here when the request that would have started it fails.

use serde_json::{Value, json};
use tracing::error;

use super::Bridge;
use crate::command::TransitionRequest;
use crate::error::CoreError;
use crate::model::{ConnectionStatus, TransitionOptions, TransitionSpec};

impl Bridge {
    pub(crate) async fn set_preview_scene(&self, scene_name: &str) -> Result<(), CoreError> {
        self.send("SetPreviewScene", json!({ "scene-name": scene_name }))
            .await
            .map(drop)
            .inspect_err(|e| error!(error = %e, "Error setting preview scene"))
    }

    /// Transition to `request.scene_name`.
    ///
    /// In studio mode the scene is staged as preview first, then
    /// transitioned to program. Otherwise the transition type and
    /// duration are set and the scene is cut to directly.
    pub(crate) async fn transition(&self, request: TransitionRequest) -> Result<(), CoreError> {
        let TransitionRequest {
            name,
            duration,
            scene_name,
        } = request;
        let name = name.filter(|n| !n.is_empty());
        let scene_name = scene_name.filter(|s| !s.is_empty());

        if self.inner.store.studio_mode() {
            if let Some(scene) = scene_name {
                if let Err(e) = self
                    .send("SetPreviewScene", json!({ "scene-name": scene }))
                    .await
                {
                    error!(error = %e, "Error setting preview scene for transition");
                    return Err(e);
                }
            }
            return self
                .transition_to_program(name, duration)
                .await
                .inspect_err(|e| error!(error = %e, "Error transitioning"));
        }

        let Some(scene) = scene_name else {
            return Err(CoreError::MissingScene);
        };

        if let Some(name) = name {
            if let Err(e) = self
                .send("SetCurrentTransition", json!({ "transition-name": name }))
                .await
            {
                error!(error = %e, "Error setting current transition");
                return Err(e);
            }
        }

        if let Some(ms) = duration.filter(|ms| *ms > 0) {
            if let Err(e) = self
                .send("SetTransitionDuration", json!({ "duration": ms }))
                .await
            {
                error!(error = %e, "Error setting transition duration");
                return Err(e);
            }
        }

        let _ = self.inner.store.transitioning.set(true);
        if let Err(e) = self
            .send("SetCurrentScene", json!({ "scene-name": scene }))
            .await
        {
            let _ = self.inner.store.transitioning.set(false);
            error!(error = %e, "Error setting scene for transition");
            return Err(e);
        }
        Ok(())
    }

    /// Transition the preview scene to program, letting the
    /// pre-transition hook adjust the options first.
    pub(crate) async fn transition_to_program(
        &self,
        name: Option<String>,
        duration: Option<u64>,
    ) -> Result<(), CoreError> {
        if self.status() != ConnectionStatus::Connected {
            return Err(CoreError::NotConnected);
        }

        let mut options = TransitionOptions::new(name, duration);
        let _ = self.inner.store.transitioning.set(true);

        if let Some(hook) = &self.inner.hooks.pre_transition {
            if let Some(replacement) = hook.pre_transition(options.clone()).await {
                options = replacement;
            }
        }

        let args = json!({ "with-transition": &options.with_transition });
        match self.send("TransitionToProgram", args).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let _ = self.inner.store.transitioning.set(false);
                let TransitionSpec { name, duration } = options.with_transition;
                Err(match e {
                    rejected @ CoreError::Rejected { .. } => CoreError::TransitionFailed {
                        name,
                        duration,
                        source: Box::new(rejected),
                    },
                    other => other,
                })
            }
        }
    }

    // ── Streaming ────────────────────────────────────────────────────

    pub(crate) async fn start_streaming(&self) -> Result<(), CoreError> {
        self.send("StartStreaming", Value::Null)
            .await
            .map(drop)
            .inspect_err(|e| error!(error = %e, "Error starting the streaming"))
    }

    pub(crate) async fn stop_streaming(&self) -> Result<(), CoreError> {
        self.send("StopStreaming", Value::Null)
            .await
            .map(drop)
            .inspect_err(|e| error!(error = %e, "Error stopping the streaming"))
    }
}
