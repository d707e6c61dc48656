//! Connection lifecycle and state mirroring between OBS and local consumers.
//!
//! This crate owns the business logic of the obsync workspace:
//!
//! - **[`Bridge`]**: Central facade for one namespace. [`start()`](Bridge::start)
//!   spawns the dispatcher, the transport event forwarder and the liveness
//!   check; [`execute()`](Bridge::execute) and [`dispatch()`](Bridge::dispatch)
//!   queue [`Command`]s, handled in arrival order together with pushed OBS
//!   events.
//!
//! - **[`StateStore`]**: The namespace's seven [`StateCell`]s (connection
//!   config, program/preview scene, scene/source lists, transitioning,
//!   studio mode), each schema-validated and independently subscribable.
//!   Only the connection config is persisted.
//!
//! - **[`CellStream<T>`]**: Subscription handle vended by a cell. Exposes
//!   `current()` / `latest()` / `changed()` and converts into a `Stream`.
//!
//! - **[`namespace`]**: Process-wide registry guaranteeing each namespace
//!   is claimed once.
//!
//! - **[`hooks`]**: The pre-transition extension point.

pub mod bridge;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod hooks;
pub mod model;
pub mod namespace;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use command::{Command, CommandResult, Completion, TransitionRequest};
pub use config::{BridgeConfig, ConnectionPolicy};
pub use error::CoreError;
pub use hooks::{Hooks, PreTransitionHook, hook_fn};
pub use namespace::DEFAULT_NAMESPACE;
pub use store::{StateCell, StateStore};
pub use stream::CellStream;

pub use model::{
    ConnectionStatus, PreviewScene, ProgramScene, Scene, SceneList, Source, SourceList,
    TransitionOptions, TransitionSpec, TransitioningNotice, WebsocketConfig,
};
