//! Todo use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/append/status/delete APIs over a store.
//! - Validate input before any I/O and run every mutation under the record
//!   lock as one read-modify-write sequence.
//!
//! # Invariants
//! - Reads (`list`, `get`, `search`) never lock and may observe a record
//!   mid-write from another process.
//! - Every mutation re-reads the record from disk after acquiring the lock.
//! - `update` only touches patch fields that are `Some`.
//! - Errors are returned as `TodoServiceError`; nothing panics across the
//!   service boundary.

use crate::config::{StoreConfig, TodoSettings};
use crate::host::Host;
use crate::lock::{LockError, LockManager, LockStatus};
use crate::model::todo::{
    display_id, is_closed_status, iso_timestamp, normalize_id, parse_timestamp, TodoIdError,
    TodoRecord, TodoSummary, DEFAULT_STATUS,
};
use crate::repo::todo_repo::{FileTodoRepository, RepoError, TodoRepository};
use crate::search::rank::filter_todos;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const MAX_ID_ATTEMPTS: u32 = 10;
const ID_HEX_LEN: usize = 8;

pub type ServiceResult<T> = Result<T, TodoServiceError>;

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// No file backs the requested id.
    NotFound(String),
    /// Required input missing or malformed; no I/O was attempted.
    Validation(String),
    Lock(LockError),
    Repo(RepoError),
    /// Every generated id collided with an existing record.
    IdGeneration { attempts: u32 },
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Todo {} not found", display_id(id)),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Lock(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::IdGeneration { attempts } => {
                write!(f, "failed to generate a unique todo id after {attempts} attempts")
            }
            Self::InconsistentState(details) => write!(f, "inconsistent todo state: {details}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lock(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LockError> for TodoServiceError {
    fn from(value: LockError) -> Self {
        Self::Lock(value)
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TodoIdError> for TodoServiceError {
    fn from(value: TodoIdError) -> Self {
        Self::Validation(value.to_string())
    }
}

/// Input for [`TodoService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTodoRequest {
    /// Required, must not be blank.
    pub title: String,
    pub tags: Vec<String>,
    /// Defaults to `open` when absent or blank.
    pub status: Option<String>,
    pub body: Option<String>,
}

impl CreateTodoRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    /// Replaces the whole body.
    pub body: Option<String>,
}

impl TodoPatch {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    fn apply(self, record: &mut TodoRecord) {
        if let Some(title) = self.title {
            record.title = title.trim().to_string();
        }
        if let Some(tags) = self.tags {
            record.tags = normalize_tags(tags);
        }
        if let Some(status) = self.status {
            record.status = status.trim().to_string();
        }
        if let Some(body) = self.body {
            record.body = body;
        }
    }
}

/// Todo service facade over a repository, a lock manager and the host.
pub struct TodoService<R: TodoRepository, H: Host> {
    repo: R,
    host: H,
    locks: LockManager,
}

impl<H: Host> TodoService<FileTodoRepository, H> {
    /// Opens the file-backed store described by `config`.
    pub fn open(config: &StoreConfig, host: H) -> Self {
        Self::new(
            FileTodoRepository::new(config.root.clone()),
            host,
            LockManager::new(config.lock_ttl),
        )
    }
}

impl<R: TodoRepository, H: Host> TodoService<R, H> {
    pub fn new(repo: R, host: H, locks: LockManager) -> Self {
        Self { repo, host, locks }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Lists all todos in default order (open first, oldest first).
    pub fn list(&self) -> ServiceResult<Vec<TodoSummary>> {
        Ok(self.repo.list_summaries()?)
    }

    /// Lists todos matching `query`, ranked by relevance.
    ///
    /// A blank query returns the default listing.
    pub fn search(&self, query: &str) -> ServiceResult<Vec<TodoSummary>> {
        Ok(filter_todos(self.list()?, query))
    }

    /// Gets one todo. `Ok(None)` when no file backs `id`.
    pub fn get(&self, id: &str) -> ServiceResult<Option<TodoRecord>> {
        let id = normalize_id(id)?;
        Ok(self.repo.read(&id)?)
    }

    /// Creates a todo with a fresh id and `created_at = now`.
    pub fn create(&self, request: CreateTodoRequest) -> ServiceResult<TodoRecord> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(TodoServiceError::Validation(
                "title is required to create a todo".to_string(),
            ));
        }

        let started_at = Instant::now();
        self.repo.ensure_root()?;
        let id = self.generate_id()?;

        let record = TodoRecord {
            id: id.clone(),
            title: title.to_string(),
            tags: normalize_tags(request.tags),
            status: request
                .status
                .map(|status| status.trim().to_string())
                .filter(|status| !status.is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: iso_timestamp(self.host.now()),
            body: request.body.unwrap_or_default(),
        };

        let result = self.locks.with_lock(self.repo.root(), &id, &self.host, || {
            self.repo.write(&record)?;
            self.read_back(&id, "created todo not found in read-back")
        });
        log_mutation("todo_create", &id, started_at, &result);
        result
    }

    /// Applies `patch` to an existing todo.
    ///
    /// Backfills an empty `created_at` with the current time.
    pub fn update(&self, id: &str, patch: TodoPatch) -> ServiceResult<TodoRecord> {
        self.mutate(id, "todo_update", true, |record| patch.apply(record))
    }

    /// Appends `text` to the body, separated by one blank line.
    pub fn append(&self, id: &str, text: &str) -> ServiceResult<TodoRecord> {
        let addition = text.trim();
        if addition.is_empty() {
            return Err(TodoServiceError::Validation(
                "text is required to append to a todo".to_string(),
            ));
        }
        self.mutate(id, "todo_append", false, |record| {
            record.body = append_body(&record.body, addition);
        })
    }

    /// Sets only the status field.
    pub fn update_status(&self, id: &str, status: &str) -> ServiceResult<TodoRecord> {
        if status.trim().is_empty() {
            return Err(TodoServiceError::Validation(
                "status is required to update a todo status".to_string(),
            ));
        }
        self.update(id, TodoPatch::status(status))
    }

    /// Deletes a todo and returns its last content.
    pub fn delete(&self, id: &str) -> ServiceResult<TodoRecord> {
        let id = normalize_id(id)?;
        if !self.repo.exists(&id)? {
            return Err(TodoServiceError::NotFound(id));
        }

        let started_at = Instant::now();
        let result = self.locks.with_lock(self.repo.root(), &id, &self.host, || {
            let record = self
                .repo
                .read(&id)?
                .ok_or_else(|| TodoServiceError::NotFound(id.clone()))?;
            self.repo.remove(&id)?;
            Ok(record)
        });
        log_mutation("todo_delete", &id, started_at, &result);
        result
    }

    /// Deletes closed todos older than `settings.gc_days`.
    ///
    /// Candidates come from the unlocked listing and are re-checked against a
    /// fresh read under their lock. Records with unparsable `created_at` are
    /// kept; records whose lock cannot be acquired are skipped. A retention
    /// reaching past the representable time range collects nothing. Returns
    /// the number of deleted todos.
    pub fn collect_garbage(&self, settings: &TodoSettings) -> ServiceResult<usize> {
        if !settings.gc {
            return Ok(0);
        }

        let now: DateTime<Utc> = self.host.now().into();
        let cutoff = ChronoDuration::try_days(i64::from(settings.gc_days))
            .and_then(|retention| now.checked_sub_signed(retention));
        let Some(cutoff) = cutoff else {
            info!(
                "event=todo_gc module=service status=ok removed=0 gc_days={} reason=cutoff_out_of_range",
                settings.gc_days
            );
            return Ok(0);
        };

        let mut removed = 0;
        for summary in self.list()? {
            if !is_collectable(&summary.status, &summary.created_at, cutoff) {
                continue;
            }

            let guard = match self.locks.acquire(self.repo.root(), &summary.id, &self.host) {
                Ok(guard) => guard,
                Err(err) => {
                    warn!(
                        "event=todo_gc module=service status=skipped id={} error={}",
                        summary.id, err
                    );
                    continue;
                }
            };
            let still_collectable = self
                .repo
                .read(&summary.id)?
                .is_some_and(|record| is_collectable(&record.status, &record.created_at, cutoff));
            if !still_collectable {
                debug!(
                    "event=todo_gc module=service status=skipped id={} reason=changed_since_listing",
                    summary.id
                );
                guard.release();
                continue;
            }
            if self.repo.remove(&summary.id)? {
                removed += 1;
            }
            guard.release();
        }

        info!(
            "event=todo_gc module=service status=ok removed={} gc_days={}",
            removed, settings.gc_days
        );
        Ok(removed)
    }

    /// Reports the lock marker currently guarding `id`, if any.
    pub fn lock_status(&self, id: &str) -> ServiceResult<Option<LockStatus>> {
        let id = normalize_id(id)?;
        Ok(self.locks.inspect(self.repo.root(), &id, self.host.now())?)
    }

    fn mutate<F>(
        &self,
        id: &str,
        event: &'static str,
        backfill_created_at: bool,
        change: F,
    ) -> ServiceResult<TodoRecord>
    where
        F: FnOnce(&mut TodoRecord),
    {
        let id = normalize_id(id)?;
        if !self.repo.exists(&id)? {
            return Err(TodoServiceError::NotFound(id));
        }

        let started_at = Instant::now();
        let result = self.locks.with_lock(self.repo.root(), &id, &self.host, || {
            let mut record = self
                .repo
                .read(&id)?
                .ok_or_else(|| TodoServiceError::NotFound(id.clone()))?;
            change(&mut record);
            if backfill_created_at && record.created_at.is_empty() {
                record.created_at = iso_timestamp(self.host.now());
            }
            self.repo.write(&record)?;
            self.read_back(&id, "updated todo not found in read-back")
        });
        log_mutation(event, &id, started_at, &result);
        result
    }

    fn read_back(&self, id: &str, details: &'static str) -> ServiceResult<TodoRecord> {
        self.repo
            .read(id)?
            .ok_or(TodoServiceError::InconsistentState(details))
    }

    fn generate_id(&self) -> ServiceResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Uuid::new_v4().simple().to_string()[..ID_HEX_LEN].to_string();
            if !self.repo.exists(&id)? {
                return Ok(id);
            }
        }
        error!(
            "event=todo_create module=service status=error error_code=id_generation_failed attempts={}",
            MAX_ID_ATTEMPTS
        );
        Err(TodoServiceError::IdGeneration {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

fn is_collectable(status: &str, created_at: &str, cutoff: DateTime<Utc>) -> bool {
    is_closed_status(status)
        && parse_timestamp(created_at).is_some_and(|created_at| created_at < cutoff)
}

/// Joins an addition onto an existing body.
///
/// Result is trimmed, uses exactly one blank line as separator and ends with
/// a newline unless empty.
pub fn append_body(existing: &str, addition: &str) -> String {
    let existing = existing.trim();
    let addition = addition.trim();
    let mut body = match (existing.is_empty(), addition.is_empty()) {
        (true, _) => addition.to_string(),
        (false, true) => existing.to_string(),
        (false, false) => format!("{existing}\n\n{addition}"),
    };
    if !body.is_empty() {
        body.push('\n');
    }
    body
}

/// Trims tags and drops blank ones, preserving order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn log_mutation(event: &str, id: &str, started_at: Instant, result: &ServiceResult<TodoRecord>) {
    match result {
        Ok(_) => info!(
            "event={} module=service status=ok id={} duration_ms={}",
            event,
            id,
            started_at.elapsed().as_millis()
        ),
        Err(TodoServiceError::Lock(err)) => warn!(
            "event={} module=service status=locked id={} duration_ms={} error={}",
            event,
            id,
            started_at.elapsed().as_millis(),
            err
        ),
        Err(err) => error!(
            "event={} module=service status=error id={} duration_ms={} error={}",
            event,
            id,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{append_body, normalize_tags};

    #[test]
    fn append_body_separates_with_one_blank_line() {
        assert_eq!(append_body("", "first"), "first\n");
        assert_eq!(append_body("first\n", "second"), "first\n\nsecond\n");
        assert_eq!(append_body("first\n\n\n", "  second  "), "first\n\nsecond\n");
        assert_eq!(append_body("", ""), "");
    }

    #[test]
    fn normalize_tags_preserves_order_and_drops_blanks() {
        let tags = vec![" b ".to_string(), "".to_string(), "a".to_string()];
        assert_eq!(normalize_tags(tags), vec!["b", "a"]);
    }
}
