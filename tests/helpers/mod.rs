#![allow(dead_code)]

use std::time::{Duration, Instant};

use bsm_relay::brokers::bsm::{BsmStore, IncomingMsg};
use bsm_relay::config::Config;
use bsm_relay::RelayEngine;

pub const TTL_SECS: f64 = 20.0;

pub fn setup_store() -> BsmStore {
    BsmStore::with_ttl(TTL_SECS)
}

pub fn setup_engine() -> RelayEngine {
    RelayEngine::new(&Config::default())
}

/// A message for `id` stamped with `sec_mark`.
pub fn bsm(id: u64, sec_mark: f64) -> IncomingMsg {
    IncomingMsg::parse(&format!(r#"{{"id":{},"secMark":{}}}"#, id, sec_mark)).expect("valid message")
}

/// Latency samples for one kind of store operation.
pub struct OpTimer {
    op: &'static str,
    started: Instant,
    samples: Vec<Duration>,
}

impl OpTimer {
    pub fn new(op: &'static str, expected: usize) -> Self {
        Self {
            op,
            started: Instant::now(),
            samples: Vec::with_capacity(expected),
        }
    }

    /// Run `f` once and record how long it took.
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.samples.push(start.elapsed());
        out
    }

    pub fn finish(mut self) -> OpStats {
        let wall = self.started.elapsed();
        self.samples.sort();
        let at = |pct: usize| {
            self.samples
                .get(self.samples.len() * pct / 100)
                .copied()
                .unwrap_or(Duration::ZERO)
        };

        OpStats {
            op: self.op,
            count: self.samples.len(),
            ops_per_sec: self.samples.len() as f64 / wall.as_secs_f64().max(f64::EPSILON),
            p50: at(50),
            p99: at(99),
            max: self.samples.last().copied().unwrap_or(Duration::ZERO),
        }
    }
}

pub struct OpStats {
    pub op: &'static str,
    pub count: usize,
    pub ops_per_sec: f64,
    pub p50: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl std::fmt::Display for OpStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<6} x{:<7} {:>10.0} ops/s | p50 {:?} | p99 {:?} | max {:?}",
            self.op, self.count, self.ops_per_sec, self.p50, self.p99, self.max
        )
    }
}
