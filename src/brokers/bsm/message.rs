//! Incoming message validation: pulls identity and timestamp out of a producer's JSON
//! while keeping the original text as the stored payload.

use bytes::Bytes;
use serde_json::value::RawValue;
use serde_json::Value;
use thiserror::Error;

use crate::brokers::bsm::record::Identity;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has no usable \"id\"")]
    MissingId,
    #[error("\"secMark\" is not numeric")]
    BadSecMark,
}

/// A validated message ready to be pushed into the store.
#[derive(Debug, Clone)]
pub struct IncomingMsg {
    pub id: Identity,
    /// `secMark` when supplied; the store stamps ingestion time otherwise.
    pub timestamp: Option<f64>,
    pub payload: Bytes,
}

impl IncomingMsg {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let text = text.trim();
        match serde_json::from_str::<Value>(text)? {
            // Double-encoded producers send the object as a JSON string
            Value::String(inner) => {
                let inner = inner.trim();
                match serde_json::from_str::<Value>(inner)? {
                    Value::Object(map) => Self::from_object(&map, inner),
                    _ => Err(MessageError::NotAnObject),
                }
            }
            Value::Object(map) => Self::from_object(&map, text),
            _ => Err(MessageError::NotAnObject),
        }
    }

    fn from_object(map: &serde_json::Map<String, Value>, text: &str) -> Result<Self, MessageError> {
        let id = map
            .get("id")
            .and_then(Identity::from_json)
            .ok_or(MessageError::MissingId)?;

        let timestamp = match map.get("secMark") {
            None => None,
            Some(v) => Some(v.as_f64().ok_or(MessageError::BadSecMark)?),
        };

        // Responses are line framed, so multi-line originals are stored compacted
        let payload = if text.contains(['\n', '\r']) {
            Bytes::from(serde_json::to_string(map)?)
        } else {
            Bytes::copy_from_slice(text.as_bytes())
        };

        Ok(Self { id, timestamp, payload })
    }
}

/// Splits the text of a push body into per-message results.
/// An array yields one result per element; anything else is a single message.
/// The length of the returned vector is the batch total used for failure reporting.
pub fn split_batch(text: &str) -> Vec<Result<IncomingMsg, MessageError>> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('[') {
        return vec![IncomingMsg::parse(text)];
    }

    match serde_json::from_str::<Vec<&RawValue>>(text) {
        Ok(items) => items.iter().map(|raw| IncomingMsg::parse(raw.get())).collect(),
        Err(e) => vec![Err(MessageError::Json(e))],
    }
}
