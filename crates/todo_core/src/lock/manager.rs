//! Advisory per-record locking via sidecar marker files.
//!
//! # Responsibility
//! - Serialize read-modify-write sequences of cooperating processes.
//! - Detect stale markers by age and route stealing through the host prompt.
//!
//! # Invariants
//! - A marker is created only if absent (`create_new`).
//! - Fresh markers (age <= TTL) are never removed by a non-owner.
//! - Stale markers are removed only after the host confirms, never when the
//!   host is non-interactive.
//! - Acquisition is not reentrant: a second acquire of a held id conflicts.
//! - At most two creation attempts are made per `acquire` call.

use super::marker::{lock_path, marker_age, read_marker, write_marker, LockMarker};
use crate::host::Host;
use crate::model::todo::{display_id, iso_timestamp};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Age after which a marker is considered abandoned.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30 * 60);

const MAX_ACQUIRE_ATTEMPTS: u32 = 2;
const STEAL_PROMPT_TITLE: &str = "Todo locked";

pub type LockResult<T> = Result<T, LockError>;

/// Lock acquisition failure.
#[derive(Debug)]
pub enum LockError {
    /// Marker exists and is still fresh.
    Conflict {
        id: String,
        session: Option<String>,
        pid: Option<u32>,
    },
    /// Marker is stale but nobody can confirm stealing it.
    StaleNonInteractive { id: String },
    /// The user refused to steal a stale marker.
    StaleDeclined { id: String },
    /// Every attempt hit an existing marker.
    Exhausted { id: String },
    Io { path: PathBuf, source: io::Error },
}

impl Display for LockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict { id, session, .. } => {
                write!(f, "Todo {} is locked", display_id(id))?;
                if let Some(session) = session {
                    write!(f, " (session {session})")?;
                }
                write!(f, ". Try again later.")
            }
            Self::StaleNonInteractive { id } => write!(
                f,
                "Todo {} lock is stale; rerun in interactive mode to steal it.",
                display_id(id)
            ),
            Self::StaleDeclined { id } => write!(f, "Todo {} remains locked.", display_id(id)),
            Self::Exhausted { id } => {
                write!(f, "Failed to acquire lock for todo {}.", display_id(id))
            }
            Self::Io { path, source } => {
                write!(f, "Failed to acquire lock `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for LockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Snapshot of a marker as seen by [`LockManager::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockStatus {
    /// Parsed payload; `None` when the sidecar content is unreadable.
    pub marker: Option<LockMarker>,
    pub age: Duration,
    pub stale: bool,
}

/// Creates, inspects and steals lock markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockManager {
    ttl: Duration,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TTL)
    }
}

impl LockManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Acquires the marker for `id` in `dir`.
    ///
    /// # Errors
    /// - `Conflict` when a fresh marker exists.
    /// - `StaleNonInteractive` / `StaleDeclined` for stale markers that were
    ///   not stolen.
    /// - `Io` for any creation failure other than "already exists".
    pub fn acquire<H: Host + ?Sized>(
        &self,
        dir: &Path,
        id: &str,
        host: &H,
    ) -> LockResult<LockGuard> {
        let path = lock_path(dir, id);

        for attempt in 1..=MAX_ACQUIRE_ATTEMPTS {
            let now = host.now();
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let marker = LockMarker {
                        id: id.to_string(),
                        pid: host.pid(),
                        session: host.session_id(),
                        created_at: iso_timestamp(now),
                    };
                    if let Err(err) = write_marker(&mut file, &marker) {
                        drop(file);
                        let _ = fs::remove_file(&path);
                        error!(
                            "event=lock_acquire module=lock status=error id={} error_code=marker_write_failed error={}",
                            id, err
                        );
                        return Err(LockError::Io { path, source: err });
                    }
                    debug!(
                        "event=lock_acquire module=lock status=ok id={} attempt={}",
                        id, attempt
                    );
                    return Ok(LockGuard::new(path, id));
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => {
                    error!(
                        "event=lock_acquire module=lock status=error id={} error_code=marker_create_failed error={}",
                        id, err
                    );
                    return Err(LockError::Io { path, source: err });
                }
            }

            let Some(age) = existing_marker_age(&path, id, now)? else {
                continue;
            };
            let owner = read_marker(&path).ok().flatten();

            if age <= self.ttl {
                debug!(
                    "event=lock_acquire module=lock status=conflict id={} age_ms={}",
                    id,
                    age.as_millis()
                );
                return Err(LockError::Conflict {
                    id: id.to_string(),
                    session: owner.as_ref().and_then(|marker| marker.session.clone()),
                    pid: owner.as_ref().map(|marker| marker.pid),
                });
            }

            if !host.is_interactive() {
                warn!(
                    "event=lock_acquire module=lock status=stale id={} age_ms={} interactive=false",
                    id,
                    age.as_millis()
                );
                return Err(LockError::StaleNonInteractive { id: id.to_string() });
            }

            let owner_hint = owner
                .as_ref()
                .and_then(|marker| marker.session.as_deref())
                .map(|session| format!(" (session {session})"))
                .unwrap_or_default();
            let question = format!(
                "Todo {} appears locked{owner_hint}. Steal the lock?",
                display_id(id)
            );
            if !host.confirm(STEAL_PROMPT_TITLE, &question) {
                return Err(LockError::StaleDeclined { id: id.to_string() });
            }

            warn!(
                "event=lock_steal module=lock status=ok id={} age_ms={}",
                id,
                age.as_millis()
            );
            if let Err(err) = fs::remove_file(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(
                        "event=lock_steal module=lock status=error id={} error={}",
                        id, err
                    );
                }
            }
        }

        Err(LockError::Exhausted { id: id.to_string() })
    }

    /// Runs `operation` while holding the marker for `id`.
    ///
    /// The marker is released on every exit path, including errors and panics.
    pub fn with_lock<H, T, E, F>(&self, dir: &Path, id: &str, host: &H, operation: F) -> Result<T, E>
    where
        H: Host + ?Sized,
        E: From<LockError>,
        F: FnOnce() -> Result<T, E>,
    {
        let guard = self.acquire(dir, id, host)?;
        let result = operation();
        guard.release();
        result
    }

    /// Reports the current marker for `id`, or `None` when unlocked.
    pub fn inspect(&self, dir: &Path, id: &str, now: SystemTime) -> LockResult<Option<LockStatus>> {
        let path = lock_path(dir, id);
        let age = match marker_age(&path, now) {
            Ok(age) => age,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(LockError::Io { path, source }),
        };
        let marker = read_marker(&path).map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(LockStatus {
            marker,
            age,
            stale: age > self.ttl,
        }))
    }
}

/// Age of a marker that blocked creation.
///
/// `Ok(None)` when it was released between the create attempt and the stat;
/// any other stat failure is fatal.
fn existing_marker_age(path: &Path, id: &str, now: SystemTime) -> LockResult<Option<Duration>> {
    match marker_age(path, now) {
        Ok(age) => Ok(Some(age)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => {
            error!(
                "event=lock_acquire module=lock status=error id={} error_code=marker_stat_failed error={}",
                id, source
            );
            Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Held lock marker. Dropping the guard releases it.
#[must_use = "dropping the guard releases the lock immediately"]
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    id: String,
    released: bool,
}

impl LockGuard {
    fn new(path: PathBuf, id: &str) -> Self {
        Self {
            path,
            id: id.to_string(),
            released: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the marker. Failures are logged and swallowed.
    pub fn release(mut self) {
        self.release_marker();
    }

    fn release_marker(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("event=lock_release module=lock status=ok id={}", self.id),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                "event=lock_release module=lock status=error id={} error={}",
                self.id, err
            ),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release_marker();
    }
}
