//! Wire frame format
//!
//! Every frame in either direction is a JSON object naming an event and
//! carrying an arbitrary payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single event frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name, e.g. `new-order`
    pub event: String,

    /// Event payload
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Create a frame
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Create a frame from any serializable payload
    ///
    /// Payloads that fail to serialize are sent as `null`.
    #[must_use]
    pub fn from_payload<T: Serialize>(event: impl Into<String>, payload: &T) -> Self {
        Self::new(event, serde_json::to_value(payload).unwrap_or_default())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Envelope(event={})", self.event)
    }
}

/// Current server time as an RFC 3339 string with millisecond precision
#[must_use]
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Stamp a relayed payload with the server time and the channel it went to
///
/// Object payloads gain `timestamp` and `room` fields (overwriting any
/// client-supplied values); anything else is wrapped as `{data, timestamp, room}`.
#[must_use]
pub fn tag_payload(payload: Value, room: &str) -> Value {
    let mut object = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    object.insert("timestamp".to_string(), Value::String(timestamp()));
    object.insert("room".to_string(), Value::String(room.to_string()));
    Value::Object(object)
}
