// Integration tests for site notices over the in-memory store.

mod common;

use common::MemoryStore;
use letterpress_core::gateway::NoticeStore;
use letterpress_core::notice::Notices;

#[test]
fn test_post_trims_and_defaults_to_draft() {
    let store = MemoryStore::default();
    let notices = Notices::new(&store);

    let notice = notices
        .post("  Holiday hours ", "\nClosed on **Monday**\n", false)
        .unwrap();
    assert_eq!(notice.title, "Holiday hours");
    assert_eq!(notice.content, "Closed on **Monday**");
    assert!(!notice.published);
    assert!(notice.updated_at.is_none());
    assert_eq!(store.get_notice(&notice.id).unwrap(), Some(notice));
}

#[test]
fn test_post_rejects_blank_fields() {
    let store = MemoryStore::default();
    let notices = Notices::new(&store);
    assert!(notices.post("   ", "body", true).is_err());
    assert!(notices.post("Title", "  ", true).is_err());
    assert!(store.list_notices().unwrap().is_empty());
}

#[test]
fn test_publish_controls_public_listing() {
    let store = MemoryStore::default();
    let notices = Notices::new(&store);
    let first = notices.post("First", "one", true).unwrap();
    let second = notices.post("Second", "two", false).unwrap();

    let all: Vec<String> = notices.list(false).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(all, vec![second.id.clone(), first.id.clone()]);
    let public: Vec<String> = notices.list(true).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(public, vec![first.id.clone()]);

    let shown = notices.publish(&second.id, true).unwrap();
    assert!(shown.published);
    assert!(shown.updated_at.is_some());
    notices.publish(&first.id, false).unwrap();
    let public: Vec<String> = notices.list(true).unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(public, vec![second.id]);

    assert!(notices.publish("missing", true).is_err());
}

#[test]
fn test_edit_keeps_publish_state() {
    let store = MemoryStore::default();
    let notices = Notices::new(&store);
    let notice = notices.post("Draft", "text", true).unwrap();

    let edited = notices.edit(&notice.id, "Final", " new text ").unwrap();
    assert_eq!(edited.title, "Final");
    assert_eq!(edited.content, "new text");
    assert!(edited.published);
    assert_eq!(edited.created_at, notice.created_at);

    assert!(notices.edit(&notice.id, "", "x").is_err());
    assert!(notices.edit("missing", "T", "x").is_err());
}

#[test]
fn test_delete_reports_missing() {
    let store = MemoryStore::default();
    let notices = Notices::new(&store);
    let notice = notices.post("Gone soon", "bye", false).unwrap();
    assert!(notices.delete(&notice.id).unwrap());
    assert!(!notices.delete(&notice.id).unwrap());
    assert!(notices.get(&notice.id).unwrap().is_none());
}
