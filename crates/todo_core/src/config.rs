//! Store configuration and per-store settings.
//!
//! # Responsibility
//! - Resolve the store root from the host working directory or environment.
//! - Load optional `settings.json` stored next to the records.
//!
//! # Invariants
//! - Configuration is an explicit value; there is no process-wide store path.
//! - Missing or malformed settings never fail the caller; defaults apply.

use crate::host::Host;
use crate::lock::DEFAULT_LOCK_TTL;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the store root.
pub const STORE_PATH_ENV: &str = "TODO_STORE_PATH";
/// Store directory name used under the working directory by default.
pub const DEFAULT_STORE_DIR: &str = ".todos";
/// Settings file name inside the store root.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

const DEFAULT_GC_DAYS: u32 = 7;

/// Location and lock policy for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub lock_ttl: Duration,
}

impl StoreConfig {
    /// Uses `root` as-is with the default lock TTL.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    /// Resolves the root for `host`, honoring `TODO_STORE_PATH`.
    pub fn from_host<H: Host + ?Sized>(host: &H) -> Self {
        Self::resolve(host, std::env::var(STORE_PATH_ENV).ok().as_deref())
    }

    /// Resolves the root from an optional override.
    ///
    /// Relative overrides resolve against the host working directory; blank
    /// overrides are ignored.
    pub fn resolve<H: Host + ?Sized>(host: &H, override_path: Option<&str>) -> Self {
        let working_directory = host.working_directory();
        let root = match override_path.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => {
                let path = Path::new(value);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    working_directory.join(path)
                }
            }
            None => working_directory.join(DEFAULT_STORE_DIR),
        };
        Self::new(root)
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }
}

/// Per-store settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoSettings {
    /// Whether closed todos are garbage collected.
    pub gc: bool,
    /// Minimum age in days before a closed todo is collected.
    pub gc_days: u32,
}

impl Default for TodoSettings {
    fn default() -> Self {
        Self {
            gc: true,
            gc_days: DEFAULT_GC_DAYS,
        }
    }
}

impl TodoSettings {
    /// Loads settings for `config`, falling back to defaults.
    pub fn load(config: &StoreConfig) -> Self {
        let path = config.settings_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(
                    "event=settings_load module=config status=error error_code=read_failed error={}",
                    err
                );
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "event=settings_load module=config status=error error_code=parse_failed error={}",
                    err
                );
                Self::default()
            }
        }
    }

    /// Writes settings as pretty JSON, creating the store root if needed.
    pub fn save(&self, config: &StoreConfig) -> io::Result<()> {
        fs::create_dir_all(&config.root)?;
        let payload = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(config.settings_path(), payload)
    }
}
