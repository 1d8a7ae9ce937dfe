//! Default ordering and fuzzy filtering over todo summaries.
//!
//! # Responsibility
//! - Provide the canonical listing order used by the repository and UI.
//! - Filter summaries by multi-token fuzzy query and rank by relevance.
//!
//! # Invariants
//! - Open todos always precede closed todos, in both orderings.
//! - Default order is ascending `created_at` within each partition.
//! - Filter order is ascending total score within each partition.
//! - Blank queries return the input untouched.

use super::fuzzy::{FuzzyMatcher, SubsequenceMatcher};
use crate::model::todo::TodoSummary;
use std::cmp::Ordering;

/// Sorts summaries: open before closed, then by `created_at` ascending.
///
/// Equal keys fall back to `id` so the order is deterministic across
/// directory enumeration orders.
pub fn sort_default(mut summaries: Vec<TodoSummary>) -> Vec<TodoSummary> {
    summaries.sort_by(|left, right| {
        left.is_closed()
            .cmp(&right.is_closed())
            .then_with(|| left.created_at.cmp(&right.created_at))
            .then_with(|| left.id.cmp(&right.id))
    });
    summaries
}

/// Filters with the default [`SubsequenceMatcher`].
pub fn filter_todos(summaries: Vec<TodoSummary>, query: &str) -> Vec<TodoSummary> {
    filter_todos_with(&SubsequenceMatcher, summaries, query)
}

/// Keeps summaries matched by every whitespace-separated token of `query`.
///
/// Each token is matched against `"<id> <title> <tags...> <status>"`; the
/// record score is the sum of token scores.
pub fn filter_todos_with<M: FuzzyMatcher + ?Sized>(
    matcher: &M,
    summaries: Vec<TodoSummary>,
    query: &str,
) -> Vec<TodoSummary> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return summaries;
    }

    let mut scored: Vec<(f64, TodoSummary)> = summaries
        .into_iter()
        .filter_map(|summary| {
            let haystack = search_text(&summary);
            let mut total = 0.0;
            for token in &tokens {
                total += matcher.score(token, &haystack)?;
            }
            Some((total, summary))
        })
        .collect();

    scored.sort_by(|(left_score, left), (right_score, right)| {
        left.is_closed()
            .cmp(&right.is_closed())
            .then_with(|| left_score.partial_cmp(right_score).unwrap_or(Ordering::Equal))
    });
    scored.into_iter().map(|(_, summary)| summary).collect()
}

/// Text a query token is matched against.
pub fn search_text(summary: &TodoSummary) -> String {
    format!(
        "{} {} {} {}",
        summary.id,
        summary.title,
        summary.tags.join(" "),
        summary.status
    )
}

#[cfg(test)]
mod tests {
    use super::{filter_todos, filter_todos_with, search_text, sort_default};
    use crate::model::todo::TodoSummary;

    fn summary(id: &str, title: &str, status: &str, created_at: &str) -> TodoSummary {
        TodoSummary {
            id: id.to_string(),
            title: title.to_string(),
            tags: Vec::new(),
            status: status.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn search_text_joins_all_metadata() {
        let mut item = summary("ab", "Fix", "open", "");
        item.tags = vec!["x".to_string(), "y".to_string()];
        assert_eq!(search_text(&item), "ab Fix x y open");
    }

    #[test]
    fn sort_ties_fall_back_to_id() {
        let sorted = sort_default(vec![summary("b", "", "open", ""), summary("a", "", "open", "")]);
        assert_eq!(sorted[0].id, "a");
    }

    #[test]
    fn filter_keeps_input_order_on_equal_scores() {
        let constant = |_: &str, _: &str| Some(1.0);
        let items = vec![summary("z", "", "open", ""), summary("a", "", "open", "")];
        let filtered = filter_todos_with(&constant, items, "q");
        assert_eq!(filtered[0].id, "z");
    }

    #[test]
    fn closed_partition_trails_even_with_better_score() {
        let items = vec![
            summary("1", "auth", "done", ""),
            summary("2", "a scattered u t h", "open", ""),
        ];
        let filtered = filter_todos(items, "auth");
        assert_eq!(filtered[0].id, "2");
        assert_eq!(filtered[1].id, "1");
    }
}
