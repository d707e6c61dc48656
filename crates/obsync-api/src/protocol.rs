//! obs-websocket v4 wire framing.
//!
//! Requests are JSON objects carrying `request-type` and a caller-chosen
//! `message-id`; replies echo the `message-id` with `status: "ok"` or
//! `status: "error"`. Pushed events carry `update-type` and no id.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Error, RequestError};

/// Error text OBS returns from `GetPreviewScene` while studio mode is off.
pub const STUDIO_MODE_NOT_ENABLED: &str = "studio mode not enabled";

// ── UpdateEvent ──────────────────────────────────────────────────────

/// A pushed event from the server.
///
/// Uses `#[serde(flatten)]` so every field beyond `update-type` is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Event name, e.g. `"SwitchScenes"`, `"TransitionBegin"`.
    #[serde(rename = "update-type")]
    pub update_type: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UpdateEvent {
    pub fn new(update_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            update_type: update_type.into(),
            fields,
        }
    }
}

// ── Frames ───────────────────────────────────────────────────────────

/// An inbound text frame, classified.
#[derive(Debug)]
pub(crate) enum Frame {
    Reply {
        message_id: String,
        body: Map<String, Value>,
    },
    Update(UpdateEvent),
}

/// Build the outbound JSON for a request.
///
/// `args` must be an object or `null`; anything else is rejected.
pub(crate) fn encode_request(
    request_type: &str,
    message_id: &str,
    args: Value,
) -> Result<String, Error> {
    let mut frame = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::Serialization(serde::de::Error::custom(format!(
                "request arguments must be an object, got {other}"
            ))));
        }
    };
    frame.insert("request-type".into(), Value::String(request_type.into()));
    frame.insert("message-id".into(), Value::String(message_id.into()));
    Ok(serde_json::to_string(&Value::Object(frame))?)
}

/// Classify an inbound text frame. Returns `None` for anything that is
/// neither a reply nor an update.
pub(crate) fn decode_frame(text: &str) -> Option<Frame> {
    let Value::Object(body) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };

    if let Some(id) = body.get("message-id").and_then(Value::as_str) {
        return Some(Frame::Reply {
            message_id: id.to_owned(),
            body,
        });
    }

    if body.contains_key("update-type") {
        return serde_json::from_value(Value::Object(body))
            .ok()
            .map(Frame::Update);
    }

    None
}

/// Turn a reply body into the request's result.
///
/// `status: "ok"` yields the body itself (minus framing keys);
/// anything else becomes [`Error::Request`].
pub(crate) fn reply_into_result(mut body: Map<String, Value>) -> Result<Value, Error> {
    let ok = body.get("status").and_then(Value::as_str) == Some("ok");
    if !ok {
        let rejection: RequestError = serde_json::from_value(Value::Object(body))?;
        return Err(Error::Request(rejection));
    }
    body.remove("status");
    body.remove("message-id");
    Ok(Value::Object(body))
}

// ── Authentication ───────────────────────────────────────────────────

/// Compute the v4 `Authenticate` response:
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`.
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}
