//! Front matter parser/serializer for todo files.
//!
//! # Responsibility
//! - Convert between file text and `TodoRecord` without touching the disk.
//! - Stay a deliberately small YAML-like subset for five known keys.
//!
//! # Invariants
//! - `parse(&serialize(r), &r.id)` reproduces `r` except for body trimming.
//! - Unknown keys are ignored on read and never written.
//! - Parsing never fails; malformed input degrades to defaults/body text.

use crate::model::todo::{TodoRecord, TodoSummary};

/// Line opening and closing the metadata block.
pub const DELIMITER: &str = "---";

/// Parses a full todo file.
///
/// Without a leading delimiter block the whole input becomes the body and all
/// metadata takes its defaults (`id` = `id_fallback`).
pub fn parse(content: &str, id_fallback: &str) -> TodoRecord {
    match split_front_matter(content) {
        Some((lines, body)) => {
            parse_summary(&lines, id_fallback).into_record(strip_separator(body))
        }
        None => TodoRecord {
            body: content.to_string(),
            ..TodoRecord::new(id_fallback)
        },
    }
}

/// Parses metadata lines found between the two delimiters.
///
/// Callers that only need listing data can feed the block lines directly and
/// skip reading the body.
pub fn parse_summary<S: AsRef<str>>(lines: &[S], id_fallback: &str) -> TodoSummary {
    let mut summary = TodoRecord::new(id_fallback).summary();

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index].as_ref();
        index += 1;

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "id" => {
                let id = unquote(value);
                if !id.is_empty() {
                    summary.id = id;
                }
            }
            "title" => summary.title = unquote(value),
            "status" => summary.status = unquote(value),
            "created_at" => summary.created_at = unquote(value),
            "tags" => {
                if value.is_empty() {
                    let mut tags = Vec::new();
                    while let Some(item) = lines
                        .get(index)
                        .and_then(|next| next.as_ref().trim_start().strip_prefix('-'))
                    {
                        // Bare `-` carries no value; quoted `""` is a real empty tag.
                        let raw = item.trim();
                        if !raw.is_empty() {
                            tags.push(unquote(raw));
                        }
                        index += 1;
                    }
                    summary.tags = tags;
                } else if value.starts_with('[') && value.ends_with(']') {
                    summary.tags = parse_inline_list(value);
                } else {
                    summary.tags = Vec::new();
                }
            }
            _ => {}
        }
    }

    summary
}

/// Serializes a record in canonical field order.
///
/// Layout: delimiter, `id`, `title`, `tags`, `status`, `created_at`,
/// delimiter, blank line, trimmed body (newline-terminated when non-empty).
pub fn serialize(record: &TodoRecord) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    push_scalar(&mut out, "id", &record.id);
    push_scalar(&mut out, "title", &record.title);
    if record.tags.is_empty() {
        out.push_str("tags: []\n");
    } else {
        out.push_str("tags:\n");
        for tag in &record.tags {
            out.push_str("  - \"");
            out.push_str(&escape(tag));
            out.push_str("\"\n");
        }
    }
    push_scalar(&mut out, "status", &record.status);
    push_scalar(&mut out, "created_at", &record.created_at);
    out.push_str(DELIMITER);
    out.push_str("\n\n");

    let body = record.body.trim();
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out
}

/// Returns `(block_lines, rest)` when `content` opens with a closed block.
pub fn split_front_matter(content: &str) -> Option<(Vec<&str>, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, mut rest) = next_line(content)?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let mut lines = Vec::new();
    while let Some((line, remaining)) = next_line(rest) {
        rest = remaining;
        if line.trim_end() == DELIMITER {
            return Some((lines, rest));
        }
        lines.push(line);
    }
    None
}

/// Returns whether a line is a block delimiter.
pub fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn next_line(input: &str) -> Option<(&str, &str)> {
    if input.is_empty() {
        return None;
    }
    let (line, rest) = match input.find('\n') {
        Some(end) => (&input[..end], &input[end + 1..]),
        None => (input, ""),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

fn strip_separator(body: &str) -> &str {
    body.trim_start_matches(|c| c == '\n' || c == '\r')
}

fn push_scalar(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": \"");
    out.push_str(&escape(value));
    out.push_str("\"\n");
}

fn parse_inline_list(value: &str) -> Vec<String> {
    value[1..value.len() - 1]
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(unquote)
        .collect()
}

/// Escapes a scalar for a double-quoted value.
///
/// Backslashes are doubled first, then quotes and line breaks are escaped.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return unescape(&value[1..value.len() - 1]);
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}
