//! Terminal-backed host.
//!
//! # Responsibility
//! - Answer host questions (cwd, session, interactivity) for a shell user.
//! - Ask lock-steal confirmations on stdin/stderr.

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use todo_core::Host;

/// Environment variable naming the current agent/shell session.
pub const SESSION_ENV: &str = "TODO_SESSION_ID";

#[derive(Debug, Clone)]
pub struct TerminalHost {
    working_directory: PathBuf,
    session_id: Option<String>,
    interactive: bool,
}

impl TerminalHost {
    /// Captures cwd and session from the process environment.
    ///
    /// `force_headless` disables prompts even on a tty.
    pub fn detect(force_headless: bool) -> io::Result<Self> {
        Ok(Self {
            working_directory: env::current_dir()?,
            session_id: env::var(SESSION_ENV)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            interactive: !force_headless && io::stdin().is_terminal(),
        })
    }
}

impl Host for TerminalHost {
    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn confirm(&self, title: &str, question: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{title}: {question} [y/N] ").is_err() || stderr.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
