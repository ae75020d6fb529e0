// Integration tests for the snapshot history.
//
// These drive the history the way an editor surface does: commit a full
// sequence after every edit, then step back and forth.

use letterpress_mod_history::{HistoryConfig, HistoryState, SequenceHistory};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: String,
    kind: &'static str,
    body: String,
}

fn item(id: &str, kind: &'static str) -> Item {
    Item {
        id: id.to_string(),
        kind,
        body: format!("{id} body"),
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_first_session_scenario() {
    let mut history: SequenceHistory<Item> = SequenceHistory::default();
    assert!(history.undo().is_none());

    let one = vec![item("a", "text")];
    history.push(&one);
    assert!(history.undo().is_none());

    let two = vec![item("a", "text"), item("b", "image")];
    history.push(&two);

    assert_eq!(history.undo(), Some(one));
    assert_eq!(history.redo(), Some(two));
    assert!(history.redo().is_none());
}

#[test]
fn test_reorder_only_edit_keeps_identities() {
    let a = item("a", "text");
    let b = item("b", "image");

    let mut history: SequenceHistory<Item> = SequenceHistory::default();
    history.push(&[a.clone(), b.clone()]);
    history.push(&[b.clone(), a.clone()]);

    let restored = history.undo().expect("undo");
    assert_eq!(restored, vec![a, b]);
    assert_eq!(restored[0].id, "a");
    assert_eq!(restored[1].id, "b");
    assert_eq!(restored[1].kind, "image");
}

#[test]
fn test_branch_discards_redo() {
    let mut history: SequenceHistory<Item> = SequenceHistory::default();
    history.push(&[item("s1", "text")]);
    history.push(&[item("s2", "text")]);
    history.undo();
    history.push(&[item("s3", "text")]);
    assert!(history.redo().is_none());
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn test_k_undos_return_matching_pushes() {
    let states: Vec<Vec<Item>> = (0..10)
        .map(|n| (0..n).map(|i| item(&format!("b{i}"), "text")).collect())
        .collect();

    for k in 0..states.len() {
        let mut history: SequenceHistory<Item> = SequenceHistory::default();
        for state in &states {
            history.push(state);
        }
        let mut last = None;
        for _ in 0..k {
            last = history.undo();
        }
        if k > 0 {
            assert_eq!(last.as_ref(), Some(&states[states.len() - 1 - k]));
        }
        assert_eq!(history.cursor(), Some(states.len() - 1 - k));
    }
}

#[test]
fn test_undo_then_redo_all_returns_to_latest() {
    let mut history: SequenceHistory<Item> = SequenceHistory::default();
    for i in 0..5 {
        history.push(&[item(&i.to_string(), "text")]);
    }
    while history.undo().is_some() {}
    assert!(history.undo().is_none());

    let mut redone = Vec::new();
    while let Some(state) = history.redo() {
        redone.push(state[0].id.clone());
    }
    assert_eq!(redone, vec!["1", "2", "3", "4"]);
    assert!(history.redo().is_none());
}

#[test]
fn test_mutating_results_never_rewrites_history() {
    let mut history: SequenceHistory<Item> = SequenceHistory::default();
    let mut live = vec![item("a", "text")];
    history.push(&live);
    live[0].body = "edited".to_string();
    history.push(&live);
    live[0].body = "scribbled after push".to_string();

    let mut undone = history.undo().expect("undo");
    assert_eq!(undone[0].body, "a body");
    undone[0].body = "scribbled on result".to_string();

    let mut redone = history.redo().expect("redo");
    assert_eq!(redone[0].body, "edited");
    redone.clear();

    assert_eq!(history.undo().expect("undo")[0].body, "a body");
}

#[test]
fn test_independent_sessions() {
    let mut first: SequenceHistory<Item> = SequenceHistory::default();
    let mut second: SequenceHistory<Item> = SequenceHistory::default();

    first.push(&[item("x", "text")]);
    first.push(&[item("y", "text")]);
    second.push(&[item("z", "audio")]);

    assert!(second.undo().is_none());
    assert_eq!(first.undo().expect("undo")[0].id, "x");
    assert_eq!(second.state(), HistoryState::Active);
}

#[test]
fn test_bounded_history_drops_oldest_only() {
    let mut history: SequenceHistory<Item> = SequenceHistory::new(HistoryConfig::bounded(4));
    for i in 0..10 {
        history.push(&[item(&i.to_string(), "button")]);
    }
    let mut seen = Vec::new();
    while let Some(state) = history.undo() {
        seen.push(state[0].id.clone());
    }
    assert_eq!(seen, vec!["8", "7", "6"]);
    assert_eq!(history.len(), 4);
}
