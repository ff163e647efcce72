use camino::Utf8Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn get_unix_timestamp() -> i64 {
    to_unix(SystemTime::now())
}

/// Modification time of `path` in unix seconds, or 0 when unavailable.
pub fn modified_unix(path: &Utf8Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(to_unix)
        .unwrap_or(0)
}

fn to_unix(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
