//! BSM Store: latest message per identity, TTL checked on pull, fair rotation by last read.
//!
//! All state lives behind one mutex so a push and a pull on the same identity never
//! interleave, two pulls never claim the same head record, and sorting always sees a
//! consistent map. The lock is never held across an await point.

use bytes::Bytes;
use hashlink::LinkedHashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::brokers::bsm::message::{IncomingMsg, MessageError};
use crate::brokers::bsm::record::{Identity, MsgRecord};
use crate::config::StoreConfig;
use crate::utils::utils_time::now_secs;

// ---------- PushReport ----------

/// Outcome of a batch push: each item is applied independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushReport {
    pub total: usize,
    pub failed: usize,
}

impl PushReport {
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

// ---------- InternalState ----------

struct InternalState {
    /// Traversal order is the rotation order: head is served next
    records: LinkedHashMap<Identity, MsgRecord>,
}

impl InternalState {
    fn new() -> Self {
        Self {
            records: LinkedHashMap::new(),
        }
    }

    fn upsert(&mut self, msg: IncomingMsg, now: f64) {
        let timestamp = msg.timestamp.unwrap_or(now);
        match self.records.get_mut(&msg.id) {
            // Refresh keeps the record's place in the rotation
            Some(rec) => rec.refresh(timestamp, msg.payload),
            None => {
                let rec = MsgRecord::new(msg.id.clone(), timestamp, msg.payload);
                self.records.insert(msg.id, rec);
            }
        }
    }

    fn sort_by_last_read(&mut self) {
        let sorted = self
            .records
            .values()
            .zip(self.records.values().skip(1))
            .all(|(a, b)| a.last_read <= b.last_read);
        if sorted {
            return;
        }

        let mut entries: Vec<(Identity, MsgRecord)> = std::mem::take(&mut self.records).into_iter().collect();
        // Stable sort: ties keep their current rotation order
        entries.sort_by(|a, b| a.1.last_read.total_cmp(&b.1.last_read));
        self.records = entries.into_iter().collect();
    }

    fn pull(&mut self, now: f64, ttl_secs: f64) -> Option<MsgRecord> {
        // Every iteration removes one record, so this is bounded by the store size
        while let Some((id, mut rec)) = self.records.pop_front() {
            if rec.is_expired(now, ttl_secs) {
                trace!("Evicting expired record {} (age {:.3}s)", id, rec.age(now));
                continue;
            }

            if !rec.active {
                // Already served since its last update: rotate it and report nothing
                self.records.insert(id, rec);
                return None;
            }

            rec.mark_read(now);
            let served = rec.clone();
            self.records.insert(id, rec);
            return Some(served);
        }
        None
    }
}

// ---------- BsmStore ----------

pub struct BsmStore {
    ttl_secs: f64,
    state: Mutex<InternalState>,
}

impl BsmStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_ttl(config.object_lifetime_secs as f64)
    }

    pub fn with_ttl(ttl_secs: f64) -> Self {
        Self {
            ttl_secs,
            state: Mutex::new(InternalState::new()),
        }
    }

    // ========================================
    // PUSH
    // ========================================

    pub fn push(&self, msg: IncomingMsg) {
        self.push_at(msg, now_secs());
    }

    pub fn push_at(&self, msg: IncomingMsg, now: f64) {
        let mut state = self.state.lock();
        state.upsert(msg, now);
    }

    /// Validate and push a single JSON message.
    pub fn push_json(&self, text: &str) -> Result<(), MessageError> {
        let msg = IncomingMsg::parse(text)?;
        self.push(msg);
        Ok(())
    }

    /// Apply every valid item, count the invalid ones, then restore fairness order once.
    pub fn push_batch<I>(&self, items: I) -> PushReport
    where
        I: IntoIterator<Item = Result<IncomingMsg, MessageError>>,
    {
        self.push_batch_at(items, now_secs())
    }

    pub fn push_batch_at<I>(&self, items: I, now: f64) -> PushReport
    where
        I: IntoIterator<Item = Result<IncomingMsg, MessageError>>,
    {
        let mut report = PushReport::default();
        let mut state = self.state.lock();
        for item in items {
            report.total += 1;
            match item {
                Ok(msg) => state.upsert(msg, now),
                Err(e) => {
                    debug!("Rejected message in batch: {}", e);
                    report.failed += 1;
                }
            }
        }
        state.sort_by_last_read();
        report
    }

    // ========================================
    // FAIRNESS
    // ========================================

    /// Reorder the rotation ascending by last read, ties in insertion order.
    pub fn sort_by_last_read(&self) {
        self.state.lock().sort_by_last_read();
    }

    // ========================================
    // PULL
    // ========================================

    /// Serve the head of the rotation if it is live and not yet delivered since its last update.
    pub fn pull(&self) -> Option<MsgRecord> {
        self.pull_at(now_secs(), false)
    }

    pub fn pull_at(&self, now: f64, force_sort: bool) -> Option<MsgRecord> {
        let mut state = self.state.lock();
        if force_sort {
            state.sort_by_last_read();
        }
        let served = state.pull(now, self.ttl_secs);
        if let Some(rec) = &served {
            trace!("Pulled {}", rec);
        }
        served
    }

    // ========================================
    // SNAPSHOT
    // ========================================

    /// Payloads of every record in rotation order, optionally only those younger than `max_age`.
    /// Never touches `active` or `last_read`.
    pub fn snapshot(&self, max_age: Option<f64>) -> Vec<Bytes> {
        self.snapshot_at(max_age, now_secs(), false)
    }

    pub fn snapshot_at(&self, max_age: Option<f64>, now: f64, force_sort: bool) -> Vec<Bytes> {
        let mut state = self.state.lock();
        if force_sort {
            state.sort_by_last_read();
        }
        state
            .records
            .values()
            .filter(|rec| max_age.map_or(true, |max| rec.age(now) < max))
            .map(|rec| rec.payload.clone())
            .collect()
    }

    // ========================================
    // INTROSPECTION
    // ========================================

    pub fn get(&self, id: &Identity) -> Option<MsgRecord> {
        self.state.lock().records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identities in current rotation order.
    pub fn order(&self) -> Vec<Identity> {
        self.state.lock().records.keys().cloned().collect()
    }
}
