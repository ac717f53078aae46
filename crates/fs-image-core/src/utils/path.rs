use crate::storage::StorageGate;
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Format used for every timestamp written to the store (local time, not UTC).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returned by [`file_times`] when the file cannot be stat'ed.
pub const UNKNOWN_TIME: &str = "1970-01-01 00:00:00";

/// Lexically normalize a path into forward-slash form with exactly one
/// trailing slash.
///
/// `.` segments and repeated separators are dropped, `..` is resolved against
/// the preceding segment, back-slashes become forward slashes. Normalizing an
/// already normalized path returns it unchanged.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." && !is_drive(last, segments.len()) => {
                    segments.pop();
                }
                // `..` above the filesystem root stays at the root
                None if absolute => {}
                Some(&last) if is_drive(last, segments.len()) => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut normalized = String::with_capacity(unified.len() + 1);
    if absolute {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if normalized.is_empty() {
        normalized.push('.');
    }
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

fn is_drive(segment: &str, depth: usize) -> bool {
    depth == 1 && segment.len() == 2 && segment.ends_with(':')
}

/// Path of `dir` relative to `root`, keeping one leading slash, so the root
/// itself maps to `/`. Both arguments must already be normalized. Returns
/// `None` when `dir` does not begin with `root`.
pub fn relative_to_root(root: &str, dir: &str) -> Option<String> {
    if !dir.starts_with(root) {
        return None;
    }
    Some(dir[root.len() - 1..].to_string())
}

/// Render a `SystemTime` as a local timestamp string.
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIME_FORMAT).to_string()
}

/// Current local time in store format.
pub fn now_local() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Creation and modification timestamps of a file, local time.
///
/// Platforms without a birth time fall back to the modification time for the
/// creation stamp.
pub fn file_times(path: &Path) -> (String, String) {
    let Ok(metadata) = fs::metadata(path) else {
        return (UNKNOWN_TIME.to_string(), UNKNOWN_TIME.to_string());
    };

    let modified = metadata.modified().ok();
    let created = metadata.created().ok().or(modified);

    (
        created.map(format_time).unwrap_or_else(|| UNKNOWN_TIME.to_string()),
        modified.map(format_time).unwrap_or_else(|| UNKNOWN_TIME.to_string()),
    )
}

/// Size of a file in bytes. A failed stat is traced as an error on `gate`
/// and reported as 0.
pub fn file_size_or_trace(gate: &StorageGate, full_name: &str) -> i64 {
    match fs::metadata(full_name) {
        Ok(m) => i64::try_from(m.len()).unwrap_or(i64::MAX),
        Err(_) => {
            gate.trace(
                "error",
                &format!("getsize() failed for file \"{}\"", full_name),
            );
            0
        }
    }
}
