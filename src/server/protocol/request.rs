//! Request envelope: one JSON object per line, discriminated by `mode`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use super::errors::ProtocolError;

pub const MODE_PUSH: &str = "push";
pub const MODE_PULL: &str = "pull";
pub const MODE_CHECK: &str = "check";

/// Top-level fields of a request. Only a JSON object deserializes into a map,
/// so arrays and scalars are rejected before any field is looked at.
type Envelope<'a> = HashMap<String, &'a RawValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `body` is the JSON text of one message or an array of messages
    Push { body: String },
    Pull { force_sort: bool },
    Check { last_updated: Option<f64>, force_sort: bool },
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        let mode = envelope.get("mode").ok_or(ProtocolError::MissingMode)?;

        match serde_json::from_str::<Value>(mode.get())? {
            Value::String(mode) if mode == MODE_PUSH => {
                let raw = field(&envelope, "msg")
                    .filter(|raw| raw.get() != "null")
                    .ok_or(ProtocolError::MissingMsg)?;
                Ok(Self::Push { body: decode_msg(raw)? })
            }
            Value::String(mode) if mode == MODE_PULL => Ok(Self::Pull {
                force_sort: typed_field::<bool>(&envelope, "sort")?.unwrap_or(false),
            }),
            Value::String(mode) if mode == MODE_CHECK => Ok(Self::Check {
                last_updated: typed_field::<f64>(&envelope, "last_updated")?,
                force_sort: typed_field::<bool>(&envelope, "sort")?.unwrap_or(false),
            }),
            Value::String(other) => Err(ProtocolError::UnknownMode(other)),
            other => Err(ProtocolError::UnknownMode(other.to_string())),
        }
    }
}

fn field<'a>(envelope: &Envelope<'a>, name: &str) -> Option<&'a RawValue> {
    envelope.get(name).copied()
}

/// Optional typed field; `null` counts as absent, a wrong type is malformed.
fn typed_field<'a, T: Deserialize<'a>>(envelope: &Envelope<'a>, name: &str) -> Result<Option<T>, ProtocolError> {
    match field(envelope, name) {
        Some(raw) => Ok(serde_json::from_str::<Option<T>>(raw.get())?),
        None => Ok(None),
    }
}

/// `msg` is normally a string holding encoded JSON; inline JSON is taken as is.
fn decode_msg(raw: &RawValue) -> Result<String, ProtocolError> {
    let text = raw.get();
    if text.starts_with('"') {
        Ok(serde_json::from_str::<String>(text)?)
    } else {
        Ok(text.to_string())
    }
}
