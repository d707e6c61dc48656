// ── Bridge ──
//
// Full lifecycle management for one OBS connection: command routing,
// reconnection, liveness checking, and mirroring remote state into the
// namespace's state cells.

mod connection;
mod orchestrator;
mod sync;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use obsync_api::{ControlTransport, TransportEvent};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::command::{Command, CommandEnvelope, CommandResult, Completion};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::hooks::Hooks;
use crate::model::{ConnectionStatus, TransitioningNotice, WebsocketConfig};
use crate::namespace;
use crate::store::StateStore;
use crate::stream::CellStream;

const DISPATCH_CHANNEL_SIZE: usize = 64;
const NOTICE_CHANNEL_SIZE: usize = 64;

/// One item on the dispatcher queue.
enum Dispatch {
    Command(CommandEnvelope),
    Transport(TransportEvent),
}

/// The reconnection loop currently running, if any.
struct ReconnectLoop {
    id: u64,
    cancel: CancellationToken,
}

// ── Bridge ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. Owns one namespace's state
/// cells and keeps them in step with the OBS instance behind the
/// transport.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    hooks: Hooks,
    store: Arc<StateStore>,
    transport: Arc<dyn ControlTransport>,
    notices: broadcast::Sender<TransitioningNotice>,
    dispatch_tx: mpsc::Sender<Dispatch>,
    dispatch_rx: Mutex<Option<mpsc::Receiver<Dispatch>>>,
    cancel: CancellationToken,
    /// Set by an explicit disconnect so the resulting closure does not
    /// trigger reconnection. Cleared by the next accepted explicit connect.
    suppress_reconnect: AtomicBool,
    reconnect: Mutex<Option<ReconnectLoop>>,
    reconnect_seq: AtomicU64,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Bridge {
    /// Create a bridge for `config.namespace`. Does NOT start any task;
    /// call [`start()`](Self::start).
    ///
    /// Fails if the namespace was already used in this process.
    pub fn new(
        transport: Arc<dyn ControlTransport>,
        config: BridgeConfig,
        hooks: Hooks,
    ) -> Result<Self, CoreError> {
        namespace::register(&config.namespace)?;

        let store = Arc::new(StateStore::new(
            &config.namespace,
            config.state_dir.as_deref(),
        ));
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(BridgeInner {
                config,
                hooks,
                store,
                transport,
                notices,
                dispatch_tx,
                dispatch_rx: Mutex::new(Some(dispatch_rx)),
                cancel: CancellationToken::new(),
                suppress_reconnect: AtomicBool::new(false),
                reconnect: Mutex::new(None),
                reconnect_seq: AtomicU64::new(0),
                task_handles: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.inner.config.namespace
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Access the namespace's state cells.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.store.status()
    }

    /// Subscribe to the connection config cell (status included).
    pub fn subscribe_connection(&self) -> CellStream<WebsocketConfig> {
        self.inner.store.websocket.subscribe()
    }

    /// Subscribe to the outbound `transitioning` notifications.
    pub fn notifications(&self) -> broadcast::Receiver<TransitioningNotice> {
        self.inner.notices.subscribe()
    }

    fn span(&self) -> tracing::Span {
        info_span!("obsync", namespace = %self.inner.config.namespace)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start background work: the transport event forwarder, the
    /// liveness check, and the dispatcher.
    ///
    /// If the persisted status says a session was active before the
    /// process stopped, one connection attempt is made before this
    /// returns. Calling `start` twice is a no-op.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let span = self.span();
        let cancel = self.inner.cancel.clone();

        // Subscribe before spawning so no event is missed.
        let events = self.inner.transport.subscribe();
        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(
            forward_transport_events(events, self.inner.dispatch_tx.clone(), cancel.clone())
                .instrument(span.clone()),
        ));
        handles.push(tokio::spawn(
            liveness_task(self.clone(), cancel.clone()).instrument(span.clone()),
        ));
        drop(handles);

        self.recover_after_restart().instrument(span.clone()).await;

        if let Some(rx) = self.inner.dispatch_rx.lock().await.take() {
            let handle = tokio::spawn(dispatcher_task(self.clone(), rx, cancel).instrument(span));
            self.inner.task_handles.lock().await.push(handle);
        }
        info!(namespace = %self.namespace(), "bridge started");
    }

    /// Stop every background task and close the transport.
    ///
    /// The persisted status is left as it was, so a restarted process
    /// resumes the session. The namespace stays registered.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }

        self.inner.transport.disconnect().await;
        debug!(namespace = %self.namespace(), "bridge stopped");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Queue a command. Its outcome goes to `completion`, if given.
    ///
    /// Commands are handled in arrival order, interleaved with pushed
    /// OBS events. A bridge that has shut down completes with
    /// [`CoreError::BridgeStopped`].
    pub async fn dispatch(&self, command: Command, completion: Option<Completion>) {
        let envelope = CommandEnvelope {
            command,
            completion,
        };
        if let Err(mpsc::error::SendError(Dispatch::Command(envelope))) =
            self.inner.dispatch_tx.send(Dispatch::Command(envelope)).await
        {
            if let Some(completion) = envelope.completion {
                completion.complete(Err(CoreError::BridgeStopped));
            }
        }
    }

    /// Queue a command and wait for its outcome.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(command, Some(Completion::from_sender(tx)))
            .await;
        rx.await.map_err(|_| CoreError::BridgeStopped)?
    }

    async fn handle_command(&self, envelope: CommandEnvelope) {
        let CommandEnvelope {
            command,
            completion,
        } = envelope;
        let kind = command.kind();
        debug!(command = kind, "handling command");

        let result = match command {
            Command::Connect {
                host,
                port,
                password,
            } => self
                .connect(host, port, password)
                .await
                .map(CommandResult::Connected),
            Command::Disconnect => self.disconnect().await.map(CommandResult::Disconnected),
            Command::SetPreviewScene { scene_name } => self
                .set_preview_scene(&scene_name)
                .await
                .map(|()| CommandResult::Ok),
            Command::Transition(request) => {
                self.transition(request).await.map(|()| CommandResult::Ok)
            }
            Command::StartStreaming => self.start_streaming().await.map(|()| CommandResult::Ok),
            Command::StopStreaming => self.stop_streaming().await.map(|()| CommandResult::Ok),
        };

        if let Err(ref e) = result {
            debug!(command = kind, error = %e, "command failed");
        }
        if let Some(completion) = completion {
            completion.complete(result);
        }
    }

    async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionOpened => debug!("transport connection opened"),
            TransportEvent::ConnectionClosed => {
                if self.inner.transport.is_connected() {
                    // Closure of a socket that has since been replaced.
                    debug!("ignoring stale connection-closed event");
                    return;
                }
                self.engage_reconnect().await;
            }
            TransportEvent::Error(message) => {
                tracing::error!(error = %message, "OBS websocket error");
                self.engage_reconnect().await;
            }
            TransportEvent::Update(update) => self.apply_update(update).await,
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Move transport events onto the dispatcher queue.
async fn forward_transport_events(
    mut events: broadcast::Receiver<TransportEvent>,
    tx: mpsc::Sender<Dispatch>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        if tx.send(Dispatch::Transport(event)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "transport event forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Handle commands and transport events one at a time, in arrival order.
async fn dispatcher_task(
    bridge: Bridge,
    mut rx: mpsc::Receiver<Dispatch>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            item = rx.recv() => {
                let Some(item) = item else { break };
                match item {
                    Dispatch::Command(envelope) => bridge.handle_command(envelope).await,
                    Dispatch::Transport(event) => bridge.handle_transport_event(event).await,
                }
            }
        }
    }
}

/// Periodically confirm that a `connected` status is backed by a live socket.
async fn liveness_task(bridge: Bridge, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(bridge.inner.config.policy.liveness_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => bridge.check_liveness().await,
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("namespace", &self.inner.config.namespace)
            .finish_non_exhaustive()
    }
}
