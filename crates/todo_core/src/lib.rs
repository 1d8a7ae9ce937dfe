//! Core domain logic for the file-backed todo store.
//! This crate is the single source of truth for record format, locking and
//! ranking rules.

pub mod codec;
pub mod config;
pub mod host;
pub mod lock;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{StoreConfig, TodoSettings};
pub use host::{HeadlessHost, Host};
pub use lock::{LockError, LockGuard, LockManager, LockMarker, LockStatus};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{display_id, is_closed_status, normalize_id, TodoRecord, TodoSummary};
pub use repo::todo_repo::{FileTodoRepository, RepoError, RepoResult, TodoRepository};
pub use search::fuzzy::{FuzzyMatcher, SubsequenceMatcher};
pub use search::rank::{filter_todos, filter_todos_with, sort_default};
pub use service::todo_service::{
    CreateTodoRequest, ServiceResult, TodoPatch, TodoService, TodoServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
