//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, lock and host calls into use-case level APIs.
//! - Keep UI/command layers decoupled from storage and locking details.

pub mod todo_service;
