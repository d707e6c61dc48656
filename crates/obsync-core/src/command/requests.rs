// ── Command request payloads ──

/// Arguments of a transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Transition to use; `None` keeps the one OBS has selected.
    pub name: Option<String>,
    /// Duration in milliseconds; `None` or `0` keeps the OBS default.
    pub duration: Option<u64>,
    /// Scene to transition to. In studio mode, `None` transitions the
    /// current preview.
    pub scene_name: Option<String>,
}
