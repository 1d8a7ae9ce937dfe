use todo_core::codec::{parse, serialize};
use todo_core::TodoRecord;

fn record(id: &str, title: &str, tags: &[&str], status: &str, created_at: &str, body: &str) -> TodoRecord {
    TodoRecord {
        id: id.to_string(),
        title: title.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        status: status.to_string(),
        created_at: created_at.to_string(),
        body: body.to_string(),
    }
}

fn assert_round_trip(original: &TodoRecord) {
    let parsed = parse(&serialize(original), &original.id);
    assert_eq!(parsed.id, original.id);
    assert_eq!(parsed.title, original.title);
    assert_eq!(parsed.tags, original.tags);
    assert_eq!(parsed.status, original.status);
    assert_eq!(parsed.created_at, original.created_at);
    assert_eq!(parsed.body.trim(), original.body.trim());
}

#[test]
fn plain_record_round_trips() {
    assert_round_trip(&record(
        "1a2b3c4d",
        "Fix login",
        &["auth", "urgent"],
        "open",
        "2026-03-01T10:00:00.000Z",
        "Steps:\n\n1. reproduce\n2. fix\n",
    ));
}

#[test]
fn quotes_backslashes_and_unicode_round_trip() {
    assert_round_trip(&record(
        "q",
        r#"Say "hi" to C:\Users\été \"twice\""#,
        &["naïve", "with \"quote\"", r"back\slash"],
        "in \"review\"",
        "",
        "Ünïcödé body with \"quotes\" and \\ backslashes ✓",
    ));
}

#[test]
fn tags_with_list_syntax_characters_round_trip() {
    assert_round_trip(&record(
        "t",
        "tags",
        &["a, b", "[x]", "- dash", "colon: value"],
        "open",
        "",
        "",
    ));
}

#[test]
fn empty_fields_round_trip() {
    assert_round_trip(&record("e", "", &[], "", "", ""));
}

#[test]
fn empty_tag_entries_round_trip() {
    assert_round_trip(&record("t", "tags", &["", "x", ""], "open", "", ""));
}

#[test]
fn title_with_line_break_stays_in_front_matter() {
    let original = record("n", "first line\nsecond: line\n---", &[], "open", "", "body");
    let text = serialize(&original);
    assert_round_trip(&original);
    assert_eq!(parse(&text, "n").body, "body\n");
}

#[test]
fn body_that_looks_like_front_matter_is_kept_verbatim() {
    let original = record(
        "b",
        "doc",
        &[],
        "open",
        "",
        "---\ntitle: not metadata\n---\nmore",
    );
    let parsed = parse(&serialize(&original), "b");
    assert_eq!(parsed.title, "doc");
    assert_eq!(parsed.body, "---\ntitle: not metadata\n---\nmore\n");
}

#[test]
fn stored_id_wins_over_fallback() {
    let original = record("stored", "x", &[], "open", "", "");
    assert_eq!(parse(&serialize(&original), "fallback").id, "stored");
}

#[test]
fn hand_written_file_with_inline_tags_and_single_quotes_parses() {
    let content = "---\n\
                   id: abc\n\
                   title: 'Write docs'\n\
                   tags: [docs, \"release notes\"]\n\
                   status: done\n\
                   created_at: 2026-02-02T00:00:00Z\n\
                   priority: high\n\
                   ---\n\
                   \n\
                   Body here.\n";
    let parsed = parse(content, "ignored");
    assert_eq!(parsed.id, "abc");
    assert_eq!(parsed.title, "Write docs");
    assert_eq!(parsed.tags, vec!["docs", "release notes"]);
    assert_eq!(parsed.status, "done");
    assert!(parsed.is_closed());
    assert_eq!(parsed.created_at, "2026-02-02T00:00:00Z");
    assert_eq!(parsed.body, "Body here.\n");
}

#[test]
fn missing_status_defaults_to_open() {
    let parsed = parse("---\ntitle: x\n---\n", "id1");
    assert_eq!(parsed.status, "open");
    assert!(parsed.tags.is_empty());
    assert_eq!(parsed.created_at, "");
}
