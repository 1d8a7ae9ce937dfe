use todo_core::{
    filter_todos, filter_todos_with, sort_default, CreateTodoRequest, HeadlessHost, StoreConfig,
    TodoService, TodoSummary,
};

fn summary(id: &str, title: &str, tags: &[&str], status: &str, created_at: &str) -> TodoSummary {
    TodoSummary {
        id: id.to_string(),
        title: title.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        status: status.to_string(),
        created_at: created_at.to_string(),
    }
}

fn ids(summaries: &[TodoSummary]) -> Vec<&str> {
    summaries.iter().map(|summary| summary.id.as_str()).collect()
}

#[test]
fn default_order_partitions_closed_and_sorts_by_creation() {
    let sorted = sort_default(vec![
        summary("c1", "", &[], "closed", "2024-01-01T00:00:00.000Z"),
        summary("o2", "", &[], "open", "2024-03-01T00:00:00.000Z"),
        summary("d1", "", &[], "done", "2023-01-01T00:00:00.000Z"),
        summary("o1", "", &[], "in-progress", "2024-02-01T00:00:00.000Z"),
        summary("o0", "", &[], "open", ""),
    ]);

    assert_eq!(ids(&sorted), vec!["o0", "o1", "o2", "d1", "c1"]);
}

#[test]
fn status_matching_for_closed_partition_is_exact() {
    let sorted = sort_default(vec![
        summary("a", "", &[], "Closed", "2024-02-01T00:00:00.000Z"),
        summary("b", "", &[], "closed", "2024-01-01T00:00:00.000Z"),
    ]);
    assert_eq!(ids(&sorted), vec!["a", "b"]);
}

#[test]
fn multi_token_query_matches_across_title_and_tags() {
    let items = vec![
        summary("1", "Fix auth bug", &["urgent"], "open", ""),
        summary("2", "Write docs", &[], "open", ""),
    ];

    let hits = filter_todos(items.clone(), "bug auth");
    assert_eq!(ids(&hits), vec!["1"]);

    let hits = filter_todos(items, "urgent fix");
    assert_eq!(ids(&hits), vec!["1"]);
}

#[test]
fn every_token_must_match() {
    let items = vec![summary("1", "Fix auth bug", &[], "open", "")];
    assert!(filter_todos(items, "auth zebra").is_empty());
}

#[test]
fn whitespace_query_returns_input_unchanged() {
    let items = vec![
        summary("b", "second", &[], "closed", ""),
        summary("a", "first", &[], "open", ""),
    ];
    let result = filter_todos(items.clone(), " \t\n ");
    assert_eq!(result, items);
}

#[test]
fn better_matches_rank_first_within_partition() {
    let items = vec![
        summary("1", "improve logging output", &[], "open", ""),
        summary("2", "login page", &[], "open", ""),
    ];
    let hits = filter_todos(items, "login");
    assert_eq!(ids(&hits), vec!["2", "1"]);
}

#[test]
fn custom_matcher_controls_membership_and_order() {
    let by_length = |needle: &str, haystack: &str| {
        haystack
            .contains(needle)
            .then(|| haystack.len() as f64)
    };
    let items = vec![
        summary("1", "a much longer title with tea", &[], "open", ""),
        summary("2", "tea", &[], "open", ""),
        summary("3", "coffee", &[], "open", ""),
    ];
    let hits = filter_todos_with(&by_length, items, "tea");
    assert_eq!(ids(&hits), vec!["2", "1"]);
}

#[test]
fn service_search_uses_stored_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let service = TodoService::open(&StoreConfig::new(dir.path()), HeadlessHost::new(dir.path()));
    let auth = service
        .create(CreateTodoRequest {
            tags: vec!["urgent".to_string()],
            ..CreateTodoRequest::new("Fix auth bug")
        })
        .unwrap();
    service.create(CreateTodoRequest::new("Write docs")).unwrap();

    let hits = service.search("bug auth").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, auth.id);
    assert_eq!(service.search("").unwrap().len(), 2);
}
