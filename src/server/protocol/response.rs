use std::borrow::Cow;
use bytes::Bytes;
use serde::Serialize;

use super::errors::ProtocolError;

/// Reply to a `pull` that found nothing to serve.
pub const EMPTY_PULL: &str = r#"{"msg": ""}"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Acknowledgement or error text
    Text(String),
    /// Stored message or rendered JSON, sent verbatim
    Data(Bytes),
}

impl Response {
    pub fn error(err: ProtocolError) -> Self {
        Response::Text(err.to_string())
    }

    pub fn push_failed(failed: usize, total: usize) -> Self {
        Response::Text(format!("ERROR: Failed to push {} / {} objects.", failed, total))
    }

    pub fn empty_pull() -> Self {
        Response::Data(Bytes::from_static(EMPTY_PULL.as_bytes()))
    }

    /// `{"msgs": [...]}` with each stored payload as a JSON string.
    pub fn check(payloads: &[Bytes]) -> Self {
        #[derive(Serialize)]
        struct CheckReply<'a> {
            msgs: Vec<Cow<'a, str>>,
        }

        let reply = CheckReply {
            msgs: payloads.iter().map(|p| String::from_utf8_lossy(p)).collect(),
        };
        match serde_json::to_vec(&reply) {
            Ok(body) => Response::Data(Bytes::from(body)),
            Err(e) => Response::error(ProtocolError::Malformed(e)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Response::Text(text) => text.as_bytes(),
            Response::Data(data) => data,
        }
    }
}
