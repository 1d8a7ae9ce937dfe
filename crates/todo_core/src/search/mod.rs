//! Fuzzy search and ranking entry points.
//!
//! # Responsibility
//! - Expose a pluggable fuzzy matcher and the ordering rules built on it.
//! - Operate on summaries only; no I/O.

pub mod fuzzy;
pub mod rank;
