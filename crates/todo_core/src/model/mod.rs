//! Domain model for file-backed todos.
//!
//! # Responsibility
//! - Define canonical record and summary shapes used by every layer.
//!
//! # Invariants
//! - A todo is identified by a stable string id that is also its file stem.
//! - A record with no backing file does not exist; there is no tombstone.

pub mod todo;
