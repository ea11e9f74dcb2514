use std::time::{SystemTime, UNIX_EPOCH};
use chrono::{DateTime, Utc};

/// Wall clock as fractional UNIX seconds, the unit `secMark` is compared in.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// RFC 3339 rendering of a fractional UNIX timestamp, "never" for 0.
pub fn format_secs(ts: f64) -> String {
    if ts <= 0.0 {
        return "never".to_string();
    }
    let millis = (ts * 1000.0) as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{ts}"))
}
