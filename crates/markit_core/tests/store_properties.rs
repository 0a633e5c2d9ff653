//! Property tests for the bookmark store.

use markit_core::{filter, Bookmark, BookmarkStore};
use markit_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn assert_invariants(store: &BookmarkStore) {
    let mut seen = HashSet::new();
    for row in store.iter() {
        assert!(seen.insert(row.id.clone()), "duplicate id {}", row.id);
        assert_eq!(&row.owner, store.owner(), "foreign row {}", row.id);
    }

    for pair in store.as_slice().windows(2) {
        assert!(
            Bookmark::newest_first(&pair[0], &pair[1]).is_lt(),
            "out of order: {} before {}",
            pair[0].id,
            pair[1].id
        );
    }
}

proptest! {
    #[test]
    fn invariants_hold_for_any_op_sequence(ops in prop::collection::vec(store_op_strategy(), 0..64)) {
        let mut store = empty_store();
        for op in ops {
            op.apply(&mut store);
            assert_invariants(&store);
        }
    }

    #[test]
    fn duplicate_insert_is_noop(rows in prop::collection::vec(bookmark_strategy(), 1..16)) {
        let mut store = empty_store();
        for row in &rows {
            store.insert(row.clone());
        }
        let before = store.snapshot();

        for row in rows {
            prop_assert!(!store.insert(row));
        }
        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn removing_absent_id_is_noop(
        rows in prop::collection::vec(bookmark_strategy(), 0..16),
        id in bookmark_id_strategy(),
    ) {
        let mut store = empty_store();
        store.replace_all(rows);
        store.remove_by_id(&id);
        let before = store.snapshot();

        prop_assert!(store.remove_by_id(&id).is_none());
        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn event_replay_is_idempotent(events in prop::collection::vec(change_event_strategy(), 0..32)) {
        let mut once = empty_store();
        for event in events.clone() {
            once.apply(event);
        }

        // Delivering every event twice in a row must not change the outcome.
        let mut twice = empty_store();
        for event in events {
            twice.apply(event.clone());
            twice.apply(event);
        }

        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn filter_is_a_subsequence(
        rows in prop::collection::vec(bookmark_strategy(), 0..16),
        query in "[a-zA-Z]{0,3}",
    ) {
        let mut store = empty_store();
        store.replace_all(rows);

        let hits = filter(store.as_slice(), &query);
        let needle = query.to_lowercase();
        let mut cursor = store.iter();
        for hit in hits {
            prop_assert!(
                hit.title.to_lowercase().contains(&needle) || hit.url.to_lowercase().contains(&needle)
            );
            prop_assert!(cursor.any(|row| row.id == hit.id), "order not preserved");
        }
    }
}

#[test]
fn delete_event_scenario() {
    let mut store = empty_store();
    store.replace_all(vec![bookmark("b1", 2), bookmark("b2", 1)]);

    store.apply(markit_core::ChangeEvent::deleted("b1"));
    let ids: Vec<_> = store.iter().map(|b| b.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["b2"]);

    store.apply(markit_core::ChangeEvent::deleted("b1"));
    let ids: Vec<_> = store.iter().map(|b| b.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["b2"]);
}

#[test]
fn filter_scenario() {
    let rows = vec![
        BookmarkBuilder::new("1").title("Go Docs").url("go.dev").created(2).build(),
        BookmarkBuilder::new("2").title("Rust Book").url("rust-lang.org").created(1).build(),
    ];

    let hits = filter(&rows, "go");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Go Docs");
}
