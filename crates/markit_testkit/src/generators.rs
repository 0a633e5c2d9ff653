//! Property-based test generators using proptest.
//!
//! Ids are drawn from a small alphabet so that generated operation
//! sequences hit duplicate inserts and repeated removals often.

use crate::fixtures::{other_owner, owner, BookmarkBuilder};
use markit_core::{Bookmark, BookmarkId, BookmarkStore, ChangeEvent};
use proptest::prelude::*;

/// Strategy for bookmark ids from a small, collision-prone space.
pub fn bookmark_id_strategy() -> impl Strategy<Value = BookmarkId> {
    (0u8..16).prop_map(|n| BookmarkId::new(format!("b{n}")))
}

/// Strategy for bookmarks of the default owner.
pub fn bookmark_strategy() -> impl Strategy<Value = Bookmark> {
    (
        bookmark_id_strategy(),
        0i64..64,
        "[A-Za-z ]{1,24}",
        "[a-z]{1,12}\\.(com|dev|org)",
    )
        .prop_map(|(id, secs, title, host)| {
            BookmarkBuilder::new(id.as_str())
                .created(secs)
                .title(&title)
                .url(&format!("https://{host}"))
                .build()
        })
}

/// Strategy for bookmarks that mostly belong to the default owner and
/// occasionally to another one.
pub fn mixed_owner_bookmark_strategy() -> impl Strategy<Value = Bookmark> {
    (bookmark_strategy(), prop::bool::weighted(0.2)).prop_map(|(mut row, foreign)| {
        if foreign {
            row.owner = other_owner();
        }
        row
    })
}

/// A single store mutation.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Insert one row.
    Insert(Bookmark),
    /// Remove by id.
    Remove(BookmarkId),
    /// Replace all contents.
    Replace(Vec<Bookmark>),
}

impl StoreOp {
    /// Applies the operation to `store`.
    pub fn apply(self, store: &mut BookmarkStore) {
        match self {
            StoreOp::Insert(row) => {
                store.insert(row);
            }
            StoreOp::Remove(id) => {
                store.remove_by_id(&id);
            }
            StoreOp::Replace(rows) => {
                store.replace_all(rows);
            }
        }
    }
}

/// Strategy for store operations, weighted towards inserts and removals.
pub fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        5 => mixed_owner_bookmark_strategy().prop_map(StoreOp::Insert),
        4 => bookmark_id_strategy().prop_map(StoreOp::Remove),
        1 => prop::collection::vec(mixed_owner_bookmark_strategy(), 0..12).prop_map(StoreOp::Replace),
    ]
}

/// Strategy for change events as a remote feed might deliver them.
pub fn change_event_strategy() -> impl Strategy<Value = ChangeEvent> {
    prop_oneof![
        3 => bookmark_strategy().prop_map(ChangeEvent::Created),
        2 => bookmark_id_strategy().prop_map(|id| ChangeEvent::Deleted { id }),
    ]
}

/// Returns an empty store for the default owner.
pub fn empty_store() -> BookmarkStore {
    BookmarkStore::new(owner())
}
