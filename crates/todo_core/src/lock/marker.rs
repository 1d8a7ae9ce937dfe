//! Lock marker payload and sidecar file helpers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// File extension of lock sidecars (`<id>.lock`).
pub const LOCK_EXTENSION: &str = "lock";

/// JSON payload stored in a lock sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMarker {
    pub id: String,
    pub pid: u32,
    #[serde(default)]
    pub session: Option<String>,
    pub created_at: String,
}

/// Returns the sidecar path guarding `id` inside `dir`.
pub fn lock_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.{LOCK_EXTENSION}"))
}

pub(crate) fn write_marker(file: &mut fs::File, marker: &LockMarker) -> io::Result<()> {
    let payload = serde_json::to_vec_pretty(marker).map_err(io::Error::other)?;
    file.write_all(&payload)?;
    file.flush()
}

/// Reads a marker payload.
///
/// Returns `Ok(None)` when the sidecar is gone or its payload is not valid JSON;
/// a foreign or truncated payload must not hide the fact that a lock exists.
pub fn read_marker(path: &Path) -> io::Result<Option<LockMarker>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    Ok(serde_json::from_str(&content).ok())
}

/// Age of the sidecar measured from its modification time.
///
/// A modification time in the future counts as age zero.
pub fn marker_age(path: &Path, now: SystemTime) -> io::Result<Duration> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
}
