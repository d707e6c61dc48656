// Shared fixtures for the bridge integration tests: a scripted
// `ControlTransport` and a few helpers.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use obsync_api::{
    ConnectOptions, ControlTransport, Error, RequestError, TransportEvent, UpdateEvent,
};
use obsync_core::{Bridge, BridgeConfig, Hooks};

// ── MockTransport ────────────────────────────────────────────────────

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    /// `status: "error"` with this text.
    Reject(String),
}

/// In-memory transport. Requests are answered from per-type scripts;
/// events are pushed with [`emit`](Self::emit).
pub struct MockTransport {
    defaults: Mutex<HashMap<String, Reply>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    connect_results: Mutex<VecDeque<Result<(), Error>>>,
    connect_delay: Mutex<Option<Duration>>,
    last_options: Mutex<Option<ConnectOptions>>,
    calls: Mutex<Vec<(String, Value)>>,
    connects: AtomicUsize,
    connected: AtomicBool,
    events: broadcast::Sender<TransportEvent>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            defaults: Mutex::new(HashMap::new()),
            queued: Mutex::new(HashMap::new()),
            connect_results: Mutex::new(VecDeque::new()),
            connect_delay: Mutex::new(None),
            last_options: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            events,
        })
    }

    /// A mock answering the five full-pull queries for a two-scene setup
    /// with studio mode off.
    pub fn with_default_scene_state() -> Arc<Self> {
        let mock = Self::new();
        mock.reply(
            "GetSceneList",
            Reply::Ok(json!({
                "current-scene": "Scene1",
                "scenes": [{"name": "Scene1"}, {"name": "Scene2"}]
            })),
        );
        mock.reply(
            "GetSourcesList",
            Reply::Ok(json!({"sources": [{"name": "Cam"}, {"name": "Mic"}]})),
        );
        mock.reply("GetCurrentScene", Reply::Ok(scene_json("Scene1", &["Cam"])));
        mock.reply(
            "GetPreviewScene",
            Reply::Reject("studio mode not enabled".into()),
        );
        mock.reply("GetStudioModeStatus", Reply::Ok(json!({"studio-mode": false})));
        mock
    }

    // ── Scripting ────────────────────────────────────────────────────

    /// Answer every `request_type` with `reply` (unless a queued reply
    /// is pending).
    pub fn reply(&self, request_type: &str, reply: Reply) {
        self.defaults
            .lock()
            .unwrap()
            .insert(request_type.into(), reply);
    }

    /// Answer the next `request_type` with `reply`.
    pub fn reply_once(&self, request_type: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(request_type.into())
            .or_default()
            .push_back(reply);
    }

    /// Make the next connection attempt fail.
    pub fn fail_next_connect(&self, reason: &str) {
        self.connect_results
            .lock()
            .unwrap()
            .push_back(Err(Error::Connect(reason.into())));
    }

    /// Delay every connection attempt by `delay`.
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = Some(delay);
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn emit(&self, update_type: &str, fields: Value) {
        let Value::Object(fields) = fields else {
            panic!("event fields must be an object");
        };
        let _ = self
            .events
            .send(TransportEvent::Update(UpdateEvent::new(update_type, fields)));
    }

    pub fn emit_error(&self, message: &str) {
        let _ = self.events.send(TransportEvent::Error(message.into()));
    }

    /// Report a closure without touching the socket, as a replaced
    /// connection would.
    pub fn emit_closed(&self) {
        let _ = self.events.send(TransportEvent::ConnectionClosed);
    }

    /// The socket drops and the closure is reported.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.events.send(TransportEvent::ConnectionClosed);
    }

    /// The socket drops and nobody says so.
    pub fn silently_drop(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.last_options.lock().unwrap().clone()
    }

    /// Request types sent so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    /// Arguments of every `request_type` sent so far.
    pub fn args_of(&self, request_type: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == request_type)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn count(&self, request_type: &str) -> usize {
        self.args_of(request_type).len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ControlTransport for MockTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<(), Error> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options);

        let delay = *self.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.connect_results.lock().unwrap().pop_front();
        if let Some(Err(e)) = result {
            return Err(e);
        }
        self.connected.store(true, Ordering::SeqCst);
        let _ = self.events.send(TransportEvent::ConnectionOpened);
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(TransportEvent::ConnectionClosed);
        }
    }

    async fn send(&self, request_type: &str, args: Value) -> Result<Value, Error> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        self.calls
            .lock()
            .unwrap()
            .push((request_type.to_owned(), args));

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(request_type)
            .and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| self.defaults.lock().unwrap().get(request_type).cloned());

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            None => Ok(json!({})),
            Some(Reply::Reject(error)) => Err(Error::Request(RequestError {
                message_id: Some(format!("mock-{request_type}")),
                status: "error".into(),
                error,
            })),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

pub fn scene_item(name: &str) -> Value {
    json!({
        "id": 1, "name": name, "type": "ffmpeg_source",
        "x": 0, "y": 0, "cx": 1920, "cy": 1080,
        "source_cx": 1920, "source_cy": 1080,
        "render": true, "locked": false, "volume": 1.0
    })
}

pub fn scene_json(name: &str, sources: &[&str]) -> Value {
    json!({
        "name": name,
        "sources": sources.iter().map(|s| scene_item(s)).collect::<Vec<_>>()
    })
}

/// A namespace no other test uses.
pub fn unique_namespace(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// A started bridge on `mock` with a fresh namespace.
pub async fn started_bridge(mock: &Arc<MockTransport>) -> Bridge {
    started_bridge_with(mock, Hooks::default()).await
}

pub async fn started_bridge_with(mock: &Arc<MockTransport>, hooks: Hooks) -> Bridge {
    let config = BridgeConfig::new(unique_namespace("test"));
    let transport: Arc<dyn ControlTransport> = mock.clone();
    let bridge = Bridge::new(transport, config, hooks).unwrap();
    bridge.start().await;
    bridge
}

/// A started bridge that has completed an explicit connect.
pub async fn connected_bridge(mock: &Arc<MockTransport>) -> Bridge {
    let bridge = started_bridge(mock).await;
    connect(&bridge).await.unwrap();
    bridge
}

pub async fn connect(bridge: &Bridge) -> Result<obsync_core::CommandResult, obsync_core::CoreError> {
    bridge
        .execute(obsync_core::Command::Connect {
            host: "127.0.0.1".into(),
            port: 4455,
            password: "secret".into(),
        })
        .await
}

/// Let spawned tasks drain their queues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
