//! Request Router: maps each request to one store operation and renders one response.
//! Every failure is turned into response text here; nothing escapes to the connection.

use tracing::debug;

use crate::brokers::bsm::split_batch;
use crate::server::protocol::{Request, Response};
use crate::utils::utils_time::now_secs;
use crate::RelayEngine;

// ========================================
// ROUTING
// ========================================

pub fn route(line: &str, engine: &RelayEngine) -> Response {
    let request = match Request::parse(line) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected request: {:?}", e);
            return Response::error(e);
        }
    };

    match request {
        Request::Push { body } => handle_push(&body, engine),
        Request::Pull { force_sort } => handle_pull(force_sort, engine),
        Request::Check { last_updated, force_sort } => handle_check(last_updated, force_sort, engine),
    }
}

// ========================================
// HANDLERS
// ========================================

fn handle_push(body: &str, engine: &RelayEngine) -> Response {
    let report = engine.store.push_batch(split_batch(body));
    debug!("Push: {} / {} objects applied", report.total - report.failed, report.total);

    if report.is_ok() {
        Response::Text(engine.ok_reply.to_string())
    } else {
        Response::push_failed(report.failed, report.total)
    }
}

fn handle_pull(force_sort: bool, engine: &RelayEngine) -> Response {
    let now = now_secs();
    match engine.store.pull_at(now, force_sort) {
        Some(rec) => Response::Data(rec.payload),
        None => Response::empty_pull(),
    }
}

fn handle_check(last_updated: Option<f64>, force_sort: bool, engine: &RelayEngine) -> Response {
    let now = now_secs();
    let payloads = engine.store.snapshot_at(last_updated, now, force_sort);
    Response::check(&payloads)
}
