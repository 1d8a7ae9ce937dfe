//! On-disk record format.
//!
//! # Responsibility
//! - Own the front matter + body text layout of a todo file.
//! - Keep the format hand-rolled and limited to the five known keys.

pub mod frontmatter;

pub use frontmatter::{parse, serialize};
