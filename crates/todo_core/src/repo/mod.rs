//! Repository layer over the record directory.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate filesystem details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return `Ok(None)` / `false` for missing records and
//!   reserve errors for real I/O failures.

pub mod todo_repo;
