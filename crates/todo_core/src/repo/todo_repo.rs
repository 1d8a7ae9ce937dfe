//! Todo repository contracts and file-backed implementation.
//!
//! # Responsibility
//! - Map record ids to `<root>/<id>.md` files and back.
//! - Keep filesystem details (listing, atomic replace, removal) out of the
//!   service layer.
//!
//! # Invariants
//! - The directory is the source of truth; nothing is cached across calls.
//! - Listing is best-effort: unreadable entries are skipped, not fatal.
//! - Writes replace the whole file via temp file + rename.
//! - Repository calls never take locks; the service owns locking.

use crate::codec::frontmatter::{self, is_delimiter};
use crate::model::todo::{TodoRecord, TodoSummary};
use crate::search::rank::sort_default;
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File extension of record files (`<id>.md`).
pub const RECORD_EXTENSION: &str = "md";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record file access.
#[derive(Debug)]
pub enum RepoError {
    Io { path: PathBuf, source: io::Error },
}

impl RepoError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "todo file `{}`: {source}", path.display()),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Repository interface over a directory of todo records.
pub trait TodoRepository {
    /// Directory holding records and lock sidecars.
    fn root(&self) -> &Path;
    /// Creates the root directory when missing.
    fn ensure_root(&self) -> RepoResult<()>;
    /// Lists summaries in default order. Missing root yields an empty list.
    fn list_summaries(&self) -> RepoResult<Vec<TodoSummary>>;
    /// Reads one record. `Ok(None)` when no file backs `id`.
    fn read(&self, id: &str) -> RepoResult<Option<TodoRecord>>;
    fn exists(&self, id: &str) -> RepoResult<bool>;
    /// Replaces the whole record file.
    fn write(&self, record: &TodoRecord) -> RepoResult<()>;
    /// Removes the record file. Returns `false` when it was already gone.
    fn remove(&self, id: &str) -> RepoResult<bool>;
}

/// Record repository rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileTodoRepository {
    root: PathBuf,
}

impl FileTodoRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing `id`.
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXTENSION}"))
    }
}

impl TodoRepository for FileTodoRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> RepoResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| RepoError::io(&self.root, err))
    }

    fn list_summaries(&self) -> RepoResult<Vec<TodoSummary>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(RepoError::io(&self.root, err)),
        };

        let mut summaries = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            let Ok(entry) = entry else {
                skipped += 1;
                continue;
            };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                skipped += 1;
                continue;
            };
            match read_summary(&path, stem) {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    skipped += 1;
                    warn!(
                        "event=todo_list module=repo status=skipped error_code=unreadable_entry error={}",
                        err
                    );
                }
            }
        }

        debug!(
            "event=todo_list module=repo status=ok count={} skipped={}",
            summaries.len(),
            skipped
        );
        Ok(sort_default(summaries))
    }

    fn read(&self, id: &str) -> RepoResult<Option<TodoRecord>> {
        let path = self.record_path(id);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(frontmatter::parse(&content, id))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RepoError::io(&path, err)),
        }
    }

    fn exists(&self, id: &str) -> RepoResult<bool> {
        let path = self.record_path(id);
        path.try_exists().map_err(|err| RepoError::io(&path, err))
    }

    fn write(&self, record: &TodoRecord) -> RepoResult<()> {
        let path = self.record_path(&record.id);
        let content = frontmatter::serialize(record);

        let result = (|| -> io::Result<()> {
            let mut temp = NamedTempFile::new_in(&self.root)?;
            temp.write_all(content.as_bytes())?;
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|err| err.error)?;
            Ok(())
        })();

        result.map_err(|err| {
            error!(
                "event=todo_write module=repo status=error id={} error_code=write_failed error={}",
                record.id, err
            );
            RepoError::io(&path, err)
        })
    }

    fn remove(&self, id: &str) -> RepoResult<bool> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(RepoError::io(&path, err)),
        }
    }
}

/// Reads only the front matter block of a record file.
///
/// Stops at the closing delimiter so large bodies are never loaded.
fn read_summary(path: &Path, id_fallback: &str) -> io::Result<TodoSummary> {
    let mut lines = BufReader::new(File::open(path)?).lines();

    let opened = match lines.next() {
        Some(first) => is_delimiter(first?.trim_start_matches('\u{feff}')),
        None => false,
    };
    let mut block = Vec::new();
    if opened {
        let mut closed = false;
        for line in lines {
            let line = line?;
            if is_delimiter(&line) {
                closed = true;
                break;
            }
            block.push(line);
        }
        if !closed {
            block.clear();
        }
    }

    Ok(frontmatter::parse_summary(&block, id_fallback))
}
