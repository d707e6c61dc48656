// ── Domain model ──
//
// Canonical types held in the state cells and exchanged with consumers.
// Wire shapes live in `obsync_api::models`; `crate::convert` maps them.

pub mod connection;
pub mod scene;
pub mod transition;

pub use connection::{ConnectionStatus, WebsocketConfig};
pub use scene::{
    Position, PreviewScene, ProgramScene, Scene, SceneList, Size, Source, SourceList,
};
pub use transition::{TransitionOptions, TransitionSpec, TransitioningNotice};
