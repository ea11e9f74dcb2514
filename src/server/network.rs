//! Network Layer: TCP listener with a capped pool of connection tasks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::server::connection_session::{handle_connection, SessionSettings};
use crate::RelayEngine;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

// ========================================
// TCP LISTENER
// ========================================

/// Accept connections until `shutdown` resolves. At most `max_connections` sessions
/// run at once; further clients wait in the listen backlog for a free slot.
pub async fn serve<F>(
    listener: TcpListener,
    engine: RelayEngine,
    settings: SessionSettings,
    max_connections: usize,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let slots = Arc::new(Semaphore::new(max_connections.max(1)));
    let mut sessions = JoinSet::new();

    loop {
        let permit = tokio::select! {
            _ = &mut shutdown => break,
            permit = slots.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let (socket, addr) = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
        };

        debug!("New connection from {}", addr);
        let engine = engine.clone();

        sessions.spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_connection(socket, engine, settings).await {
                warn!("Error handling connection from {}: {}", addr, e);
            }
            debug!("Connection closed from {}", addr);
        });

        while sessions.try_join_next().is_some() {}
    }

    info!("Listener stopped, closing {} open sessions", sessions.len());
    sessions.abort_all();
}
