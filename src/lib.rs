pub mod brokers;
pub mod config;
pub mod server;
pub mod utils;

use std::sync::Arc;
use crate::brokers::bsm::BsmStore;
use crate::config::Config;

// ========================================
// ENGINE
// ========================================

/// Shared state handed to every connection task.
/// Cheap to clone: every field is reference counted.
#[derive(Clone)]
pub struct RelayEngine {
    pub store: Arc<BsmStore>,
    /// Acknowledgement for a fully applied push
    pub ok_reply: Arc<str>,
}

impl RelayEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(BsmStore::new(config.store.clone())),
            ok_reply: Arc::from(config.server.ok_reply.as_str()),
        }
    }
}
