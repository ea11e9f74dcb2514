//! Connection Session Layer: one task per client, serving requests in arrival order
//! until the peer closes or stays silent past the idle timeout.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::SinkExt;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::server::protocol::{InboundFrame, RelayCodec, Response};
use crate::server::routing::route;
use crate::RelayEngine;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub max_request_len: usize,
    pub idle_timeout: Duration,
}

impl From<&ServerConfig> for SessionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_request_len: config.data_buffer,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }
}

/// Drive a single client connection. Store state is never rolled back on disconnect.
///
/// The idle timeout bounds each socket read, so a client that keeps sending bytes
/// stays connected however long a single request line takes to complete.
pub async fn handle_connection(
    socket: TcpStream,
    engine: RelayEngine,
    settings: SessionSettings,
) -> io::Result<()> {
    let session = Uuid::new_v4();
    let (mut reader, writer) = socket.into_split();
    let mut decoder = RelayCodec::new(settings.max_request_len);
    let mut sink = FramedWrite::new(writer, RelayCodec::new(settings.max_request_len));
    let mut buffer = BytesMut::with_capacity(READ_CHUNK);

    loop {
        while let Some(frame) = decoder.decode(&mut buffer)? {
            if let Some(response) = respond(frame, &engine, session) {
                sink.feed(response).await?;
            }
        }
        sink.flush().await?;

        let n = match timeout(settings.idle_timeout, reader.read_buf(&mut buffer)).await {
            Err(_) => {
                debug!("Session {} idle for {:?}, disconnecting", session, settings.idle_timeout);
                break;
            }
            Ok(read) => read?,
        };

        if n == 0 {
            // Peer closed: serve a final unterminated line, if any
            while let Some(frame) = decoder.decode_eof(&mut buffer)? {
                if let Some(response) = respond(frame, &engine, session) {
                    sink.feed(response).await?;
                }
            }
            sink.flush().await?;
            break;
        }
    }

    debug!("Session {} closed", session);
    Ok(())
}

fn respond(frame: InboundFrame, engine: &RelayEngine, session: Uuid) -> Option<Response> {
    match frame {
        InboundFrame::Request(line) => {
            if line.trim().is_empty() {
                return None;
            }
            trace!("Session {} request: {}", session, line);
            Some(route(&line, engine))
        }
        InboundFrame::Rejected(err) => {
            warn!("Session {} sent an unusable request: {}", session, err);
            Some(Response::error(err))
        }
    }
}
