//! Advisory lock protocol for record mutations.
//!
//! # Responsibility
//! - Gate every mutation of a record behind a `<id>.lock` sidecar marker.
//!
//! # Invariants
//! - Cooperating callers serialize mutations; the filesystem does not enforce
//!   exclusion against callers that ignore the protocol.

mod manager;
pub mod marker;

pub use manager::{LockError, LockGuard, LockManager, LockResult, LockStatus, DEFAULT_LOCK_TTL};
pub use marker::{lock_path, LockMarker};
