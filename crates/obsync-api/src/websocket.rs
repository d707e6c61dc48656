//! WebSocket control transport.
//!
//! Opens a `ws://` (or `wss://`) socket to obs-websocket, performs the v4
//! authentication handshake, and splits the socket into a writer task and
//! a reader task. Replies are routed back to waiting requests by
//! `message-id`; pushed events fan out through a
//! [`tokio::sync::broadcast`] channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use obsync_api::{ConnectOptions, ControlTransport, TransportConfig, WebSocketTransport};
//!
//! let transport = WebSocketTransport::new(TransportConfig::default());
//! transport
//!     .connect(ConnectOptions { address: "localhost:4444".into(), password: None, secure: false })
//!     .await?;
//!
//! let scenes = transport.send("GetSceneList", serde_json::Value::Null).await?;
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{self, Frame};
use crate::transport::{ConnectOptions, ControlTransport, TransportConfig, TransportEvent};

type PendingReplies = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value, Error>>>>>;

// ── WebSocketTransport ───────────────────────────────────────────────

/// obs-websocket client over tokio-tungstenite.
///
/// Cheaply cloneable; all clones share one socket.
#[derive(Clone)]
pub struct WebSocketTransport {
    inner: Arc<Inner>,
}

struct Inner {
    config: TransportConfig,
    event_tx: broadcast::Sender<TransportEvent>,
    connected: AtomicBool,
    /// Id of the newest session. Only that session's reader may clear
    /// `connected` or announce a closure.
    generation: AtomicU64,
    session: Mutex<Option<Session>>,
}

/// One opened socket and the tasks serving it.
struct Session {
    id: u64,
    cancel: CancellationToken,
    writer: mpsc::UnboundedSender<Message>,
    pending: PendingReplies,
    write_task: JoinHandle<()>,
    read_task: JoinHandle<()>,
}

impl WebSocketTransport {
    pub fn new(config: TransportConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                event_tx,
                connected: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                session: Mutex::new(None),
            }),
        }
    }

    /// Send a request over the open socket, without checking whether the
    /// handshake has completed. Used by the handshake itself.
    async fn request(&self, request_type: &str, args: Value) -> Result<Value, Error> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let frame = protocol::encode_request(request_type, &message_id, args)?;

        let (writer, pending) = {
            let session = self.inner.session.lock().await;
            let session = session.as_ref().ok_or(Error::NotConnected)?;
            (session.writer.clone(), Arc::clone(&session.pending))
        };

        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(message_id.clone(), tx);

        if writer.send(Message::text(frame)).is_err() {
            pending.lock().await.remove(&message_id);
            return Err(Error::Closed);
        }
        tracing::trace!(request_type, message_id = %message_id, "request sent");

        let timeout = self.inner.config.request_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Closed),
            Err(_) => {
                pending.lock().await.remove(&message_id);
                Err(Error::Timeout {
                    request_type: request_type.to_owned(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Run the v4 auth handshake on a freshly opened socket.
    async fn authenticate(&self, options: &ConnectOptions) -> Result<(), Error> {
        let reply = self.request("GetAuthRequired", Value::Null).await?;
        if reply.get("authRequired").and_then(Value::as_bool) != Some(true) {
            tracing::debug!("server does not require authentication");
            return Ok(());
        }

        let password = options
            .password
            .as_ref()
            .ok_or_else(|| Error::Auth("server requires a password".into()))?;
        let challenge = reply
            .get("challenge")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Auth("missing auth challenge".into()))?;
        let salt = reply
            .get("salt")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Auth("missing auth salt".into()))?;

        let auth = protocol::auth_response(password.expose_secret(), salt, challenge);
        match self.request("Authenticate", json!({ "auth": auth })).await {
            Ok(_) => Ok(()),
            Err(Error::Request(rejection)) => Err(Error::Auth(rejection.error)),
            Err(e) => Err(e),
        }
    }

    /// Tear down whatever socket is currently open and wait for its tasks
    /// to finish, so `connected` is settled when this returns.
    async fn close_session(&self) {
        let Some(session) = self.inner.session.lock().await.take() else {
            return;
        };
        let Session {
            id,
            cancel,
            writer,
            write_task,
            read_task,
            ..
        } = session;

        let _ = writer.send(Message::Close(None));
        drop(writer);
        let grace = self.inner.config.request_timeout;
        join_within(write_task, grace).await;
        cancel.cancel();
        join_within(read_task, grace).await;
        tracing::debug!(session = id, "session closed");
    }
}

#[async_trait]
impl ControlTransport for WebSocketTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<(), Error> {
        if self.inner.connected.load(Ordering::SeqCst) {
            return Err(Error::Connect("socket already open".into()));
        }
        self.close_session().await;

        let url = build_url(&options)?;
        tracing::info!(url = %url, "connecting to obs-websocket");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        let (sink, stream) = ws_stream.split();

        let id = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let pending: PendingReplies = Arc::default();
        let (writer, writer_rx) = mpsc::unbounded_channel();

        let write_task = tokio::spawn(write_loop(sink, writer_rx, cancel.clone()));
        let read_task = tokio::spawn(read_loop(
            stream,
            Arc::clone(&self.inner),
            SessionHandle {
                id,
                cancel: cancel.clone(),
                pending: Arc::clone(&pending),
            },
        ));
        *self.inner.session.lock().await = Some(Session {
            id,
            cancel,
            writer,
            pending,
            write_task,
            read_task,
        });

        if let Err(e) = self.authenticate(&options).await {
            tracing::warn!(error = %e, "obs-websocket handshake failed");
            self.close_session().await;
            return Err(e);
        }

        self.inner.connected.store(true, Ordering::SeqCst);
        let _ = self.inner.event_tx.send(TransportEvent::ConnectionOpened);
        tracing::info!(session = id, "obs-websocket connected");
        Ok(())
    }

    async fn disconnect(&self) {
        self.close_session().await;
    }

    async fn send(&self, request_type: &str, args: Value) -> Result<Value, Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.request(request_type, args).await
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.event_tx.subscribe()
    }
}

// ── Socket tasks ─────────────────────────────────────────────────────

/// What a reader needs to know about the session it serves.
struct SessionHandle {
    id: u64,
    cancel: CancellationToken,
    pending: PendingReplies,
}

/// Wait for a session task, aborting it if it overstays `grace`.
async fn join_within(mut task: JoinHandle<()>, grace: std::time::Duration) {
    if tokio::time::timeout(grace, &mut task).await.is_err() {
        tracing::debug!("session task did not stop in time, aborting");
        task.abort();
        let _ = task.await;
    }
}

/// Forward queued frames to the socket until cancelled or the queue closes.
async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    tracing::debug!(error = %e, "WebSocket write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        }
    }
    let _ = sink.close().await;
}

/// Read frames until the socket ends, then fail this session's outstanding
/// requests and, if it is still the current session, announce the closure.
async fn read_loop<S>(mut stream: S, inner: Arc<Inner>, session: SessionHandle)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let SessionHandle {
        id,
        cancel,
        pending,
    } = session;
    let is_current = || inner.generation.load(Ordering::SeqCst) == id;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => dispatch_frame(&text, &inner, &pending).await,
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "WebSocket close frame received");
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read error");
                        if is_current() {
                            let _ = inner.event_tx.send(TransportEvent::Error(e.to_string()));
                        }
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
                    }
                }
            }
        }
    }

    cancel.cancel();
    for (_, waiter) in pending.lock().await.drain() {
        let _ = waiter.send(Err(Error::Closed));
    }
    if is_current() && inner.connected.swap(false, Ordering::SeqCst) {
        let _ = inner.event_tx.send(TransportEvent::ConnectionClosed);
    }
    tracing::debug!(session = id, "WebSocket reader exiting");
}

/// Route one text frame: replies to their waiter, updates to subscribers.
async fn dispatch_frame(text: &str, inner: &Inner, pending: &PendingReplies) {
    match protocol::decode_frame(text) {
        Some(Frame::Reply { message_id, body }) => {
            let waiter = pending.lock().await.remove(&message_id);
            match waiter {
                Some(waiter) => {
                    let _ = waiter.send(protocol::reply_into_result(body));
                }
                None => tracing::debug!(message_id = %message_id, "reply for unknown request"),
            }
        }
        Some(Frame::Update(event)) => {
            tracing::trace!(update_type = %event.update_type, "update received");
            // Ignore send errors -- just means no active subscribers right now
            let _ = inner.event_tx.send(TransportEvent::Update(event));
        }
        None => tracing::debug!("ignoring unrecognised frame"),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_url(options: &ConnectOptions) -> Result<Url, Error> {
    let scheme = if options.secure { "wss" } else { "ws" };
    let url = Url::parse(&format!("{scheme}://{}", options.address))
        .map_err(|e| Error::InvalidAddress(format!("{}: {e}", options.address)))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidAddress(options.address.clone()));
    }
    Ok(url)
}
