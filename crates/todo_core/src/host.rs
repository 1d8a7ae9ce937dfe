//! Capabilities supplied by the embedding application.
//!
//! # Responsibility
//! - Describe what core needs from its host: a working directory, process and
//!   session identity, a wall clock, and a yes/no prompt for lock stealing.
//!
//! # Invariants
//! - `confirm` is only called when `is_interactive()` returns `true`.

use std::path::PathBuf;
use std::time::SystemTime;

/// Host-provided capabilities consumed by store and lock operations.
pub trait Host {
    /// Directory the default store root is resolved against.
    fn working_directory(&self) -> PathBuf;

    /// Opaque identifier of the calling session, recorded in lock markers.
    fn session_id(&self) -> Option<String>;

    /// Whether a human is available to answer `confirm`.
    fn is_interactive(&self) -> bool;

    /// Asks a yes/no question. Blocks until the user answers.
    fn confirm(&self, title: &str, question: &str) -> bool;

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn pid(&self) -> u32 {
        std::process::id()
    }
}

/// Non-interactive host for scripted callers.
///
/// Never confirms anything, so stale locks are reported instead of stolen.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    working_directory: PathBuf,
    session_id: Option<String>,
}

impl HeadlessHost {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

impl Host for HeadlessHost {
    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn confirm(&self, _title: &str, _question: &str) -> bool {
        false
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn working_directory(&self) -> PathBuf {
        (**self).working_directory()
    }

    fn session_id(&self) -> Option<String> {
        (**self).session_id()
    }

    fn is_interactive(&self) -> bool {
        (**self).is_interactive()
    }

    fn confirm(&self, title: &str, question: &str) -> bool {
        (**self).confirm(title, question)
    }

    fn now(&self) -> SystemTime {
        (**self).now()
    }

    fn pid(&self) -> u32 {
        (**self).pid()
    }
}
