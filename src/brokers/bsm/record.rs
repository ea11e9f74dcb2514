//! Message Record: the latest message known for one identity.

use std::fmt;
use bytes::Bytes;
use serde_json::Value;

use crate::utils::utils_time::format_secs;

// ---------- Identity ----------

/// Key naming the real-world object a message describes.
/// Holds the canonical JSON text of the `id` value, so `1` and `"1"` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Accepts strings, numbers and booleans; anything else carries no usable identity.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(Self(value.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------- MsgRecord ----------

#[derive(Debug, Clone)]
pub struct MsgRecord {
    pub id: Identity,
    /// `secMark` of the message, or ingestion time when the producer sent none.
    pub timestamp: f64,
    /// The message exactly as it arrived.
    pub payload: Bytes,
    /// Updated since last delivered to a consumer.
    pub active: bool,
    /// When the record was last delivered, 0 if never.
    pub last_read: f64,
}

impl MsgRecord {
    pub fn new(id: Identity, timestamp: f64, payload: Bytes) -> Self {
        Self {
            id,
            timestamp,
            payload,
            active: true,
            last_read: 0.0,
        }
    }

    /// Overwrite content and re-arm for delivery. `last_read` is left alone.
    pub(crate) fn refresh(&mut self, timestamp: f64, payload: Bytes) {
        self.timestamp = timestamp;
        self.payload = payload;
        self.active = true;
    }

    pub(crate) fn mark_read(&mut self, now: f64) {
        self.last_read = self.last_read.max(now);
        self.active = false;
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    pub fn is_expired(&self, now: f64, ttl_secs: f64) -> bool {
        self.age(now) > ttl_secs
    }

    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl fmt::Display for MsgRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}, active: {}, last read: {}, timestamp: {} | msg: {}",
            self.id,
            self.active,
            format_secs(self.last_read),
            self.timestamp,
            self.payload_str()
        )
    }
}
