//! Todo domain model.
//!
//! # Responsibility
//! - Define the persisted todo record and its body-less summary projection.
//! - Own id display/normalization rules shared by every layer.
//!
//! # Invariants
//! - `id` is immutable after creation and doubles as the file stem.
//! - Only the lowercase statuses `closed` and `done` count as closed.
//! - An empty `status` is still an open todo.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// Status assigned when a record does not carry one.
pub const DEFAULT_STATUS: &str = "open";

const CLOSED_STATUSES: &[&str] = &["closed", "done"];
const DISPLAY_PREFIX: &str = "TODO-";

/// Persisted todo document: flat metadata plus a free-text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: String,
    pub title: String,
    /// Order is preserved but carries no meaning.
    pub tags: Vec<String>,
    pub status: String,
    /// ISO-8601 timestamp. Empty is legal and sorts first.
    pub created_at: String,
    /// Markdown body, stored after the front matter block.
    pub body: String,
}

/// Metadata-only projection used by listing and search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoSummary {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub status: String,
    pub created_at: String,
}

impl TodoRecord {
    /// Creates a record with default metadata and an empty body.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            tags: Vec::new(),
            status: DEFAULT_STATUS.to_string(),
            created_at: String::new(),
            body: String::new(),
        }
    }

    /// Drops the body and returns the listing projection.
    pub fn summary(&self) -> TodoSummary {
        TodoSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            tags: self.tags.clone(),
            status: self.status.clone(),
            created_at: self.created_at.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        is_closed_status(&self.status)
    }
}

impl TodoSummary {
    pub fn is_closed(&self) -> bool {
        is_closed_status(&self.status)
    }

    /// Re-attaches a body to build a full record.
    pub fn into_record(self, body: impl Into<String>) -> TodoRecord {
        TodoRecord {
            id: self.id,
            title: self.title,
            tags: self.tags,
            status: self.status,
            created_at: self.created_at,
            body: body.into(),
        }
    }
}

/// Returns whether a status value is one of the closed states.
///
/// Matching is exact: `Done` or ` closed ` are open.
pub fn is_closed_status(status: &str) -> bool {
    CLOSED_STATUSES.contains(&status)
}

/// Formats an id for user-facing messages (`TODO-<id>`).
pub fn display_id(id: &str) -> String {
    format!("{DISPLAY_PREFIX}{id}")
}

/// Formats a wall-clock instant as UTC ISO-8601 with millisecond precision.
///
/// Fixed width keeps lexicographic order equal to chronological order.
pub fn iso_timestamp(at: SystemTime) -> String {
    DateTime::<Utc>::from(at).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored `created_at` value. Returns `None` for empty/foreign input.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Id input validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoIdError {
    Empty,
    /// Id would escape the store directory or collide with sidecar files.
    IllegalCharacters(String),
}

impl Display for TodoIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "todo id must not be empty"),
            Self::IllegalCharacters(value) => {
                write!(f, "todo id contains illegal characters: `{value}`")
            }
        }
    }
}

impl Error for TodoIdError {}

/// Normalizes user-supplied id input.
///
/// Accepts `abc123`, `#abc123`, `TODO-abc123` and `todo-abc123`.
pub fn normalize_id(raw: &str) -> Result<String, TodoIdError> {
    let mut value = raw.trim();
    if let Some(rest) = value.strip_prefix('#') {
        value = rest.trim_start();
    }
    if value.len() >= DISPLAY_PREFIX.len()
        && value.is_char_boundary(DISPLAY_PREFIX.len())
        && value[..DISPLAY_PREFIX.len()].eq_ignore_ascii_case(DISPLAY_PREFIX)
    {
        value = &value[DISPLAY_PREFIX.len()..];
    }

    if value.is_empty() {
        return Err(TodoIdError::Empty);
    }
    if value
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '.' || c.is_whitespace() || c.is_control())
    {
        return Err(TodoIdError::IllegalCharacters(value.to_string()));
    }
    Ok(value.to_string())
}
