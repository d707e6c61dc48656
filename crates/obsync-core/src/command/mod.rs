// ── Command API ──
//
// Every inbound operation flows through the `Command` enum. The bridge's
// dispatcher handles commands and pushed OBS events from one queue, in
// arrival order.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;

use crate::error::CoreError;

pub mod requests;

pub use requests::TransitionRequest;

/// All operations a bridge accepts.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    // ── Connection ───────────────────────────────────────────────────
    Connect {
        host: String,
        port: u16,
        password: String,
    },
    Disconnect,

    // ── Scenes ───────────────────────────────────────────────────────
    SetPreviewScene {
        scene_name: String,
    },
    Transition(TransitionRequest),

    // ── Streaming ────────────────────────────────────────────────────
    StartStreaming,
    StopStreaming,
}

impl Command {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::SetPreviewScene { .. } => "previewScene",
            Self::Transition(_) => "transition",
            Self::StartStreaming => "startStreaming",
            Self::StopStreaming => "stopStreaming",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { host, port, .. } => f
                .debug_struct("Connect")
                .field("host", host)
                .field("port", port)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Disconnect => f.write_str("Disconnect"),
            Self::SetPreviewScene { scene_name } => f
                .debug_struct("SetPreviewScene")
                .field("scene_name", scene_name)
                .finish(),
            Self::Transition(request) => f.debug_tuple("Transition").field(request).finish(),
            Self::StartStreaming => f.write_str("StartStreaming"),
            Self::StopStreaming => f.write_str("StopStreaming"),
        }
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Carries the confirmation message.
    Connected(String),
    /// Carries the confirmation message.
    Disconnected(String),
    Ok,
}

// ── Completion ───────────────────────────────────────────────────────

type Deliver = Box<dyn FnOnce(Result<CommandResult, CoreError>) + Send>;

/// Where a command's outcome goes. Invoked at most once.
///
/// Several parties may hold the [`handled`](Self::handle) flag; once any
/// of them marks it, the completion is dropped without being invoked.
pub struct Completion {
    handled: Arc<AtomicBool>,
    deliver: Deliver,
}

impl Completion {
    pub fn new(f: impl FnOnce(Result<CommandResult, CoreError>) + Send + 'static) -> Self {
        Self {
            handled: Arc::new(AtomicBool::new(false)),
            deliver: Box::new(f),
        }
    }

    /// Deliver into a oneshot channel.
    pub fn from_sender(tx: oneshot::Sender<Result<CommandResult, CoreError>>) -> Self {
        Self::new(move |result| {
            let _ = tx.send(result);
        })
    }

    /// Shared flag; storing `true` suppresses delivery.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.handled)
    }

    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::SeqCst)
    }

    /// Deliver `result` unless someone already handled it.
    /// Returns `true` if delivered.
    pub fn complete(self, result: Result<CommandResult, CoreError>) -> bool {
        if self.handled.swap(true, Ordering::SeqCst) {
            return false;
        }
        (self.deliver)(result);
        true
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("handled", &self.is_handled())
            .finish_non_exhaustive()
    }
}

/// A command plus where to send its outcome.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub completion: Option<Completion>,
}
