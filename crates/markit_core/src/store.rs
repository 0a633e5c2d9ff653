//! In-memory bookmark store.

use crate::bookmark::Bookmark;
use crate::change::ChangeEvent;
use crate::error::{CoreError, CoreResult};
use crate::types::{BookmarkId, OwnerId};
use std::collections::HashSet;
use tracing::warn;

/// The known bookmarks of one owner, newest first.
///
/// The store:
/// - Is scoped to a single owner and rejects rows of any other owner
/// - Never holds two entries with the same id
/// - Keeps entries ordered by `created_at` descending (ties by id)
/// - Treats duplicate inserts and missing removals as no-ops
///
/// The store performs no I/O. It is owned by the sync controller, which is
/// the only writer; everyone else reads [`snapshot`](Self::snapshot)s.
#[derive(Debug, Clone)]
pub struct BookmarkStore {
    owner: OwnerId,
    entries: Vec<Bookmark>,
    ids: HashSet<BookmarkId>,
    revision: u64,
}

impl BookmarkStore {
    /// Creates an empty store scoped to `owner`.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            entries: Vec::new(),
            ids: HashSet::new(),
            revision: 0,
        }
    }

    /// Returns the owner this store is scoped to.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Returns the number of bookmarks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a bookmark with `id` is present.
    pub fn contains(&self, id: &BookmarkId) -> bool {
        self.ids.contains(id)
    }

    /// Looks up a bookmark by id.
    pub fn get(&self, id: &BookmarkId) -> Option<&Bookmark> {
        if !self.ids.contains(id) {
            return None;
        }
        self.entries.iter().find(|b| &b.id == id)
    }

    /// Monotonic counter bumped on every effective mutation.
    ///
    /// Observers compare revisions to decide whether derived views need to
    /// be recomputed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Checks that `bookmark` belongs to this store's owner.
    pub fn check_owner(&self, bookmark: &Bookmark) -> CoreResult<()> {
        if bookmark.owner == self.owner {
            Ok(())
        } else {
            Err(CoreError::ForeignOwner {
                expected: self.owner.clone(),
                found: bookmark.owner.clone(),
            })
        }
    }

    /// Replaces the whole contents with a freshly fetched sequence.
    ///
    /// The input is re-sorted; duplicate ids keep their first occurrence and
    /// rows of other owners are dropped. Returns the resulting length.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = Bookmark>) -> usize {
        let mut ids = HashSet::new();
        let mut entries = Vec::new();

        for item in items {
            if let Err(e) = self.check_owner(&item) {
                warn!(id = %item.id, "dropping fetched row: {e}");
                continue;
            }
            if ids.insert(item.id.clone()) {
                entries.push(item);
            }
        }
        entries.sort_by(Bookmark::newest_first);

        self.entries = entries;
        self.ids = ids;
        self.revision += 1;
        self.entries.len()
    }

    /// Inserts one bookmark at its ordered position.
    ///
    /// Returns false without changing anything if the id is already present
    /// or the row belongs to another owner.
    pub fn insert(&mut self, item: Bookmark) -> bool {
        if let Err(e) = self.check_owner(&item) {
            warn!(id = %item.id, "ignoring row: {e}");
            return false;
        }
        if self.ids.contains(&item.id) {
            return false;
        }

        let pos = self
            .entries
            .binary_search_by(|probe| Bookmark::newest_first(probe, &item))
            .unwrap_or_else(|pos| pos);
        self.ids.insert(item.id.clone());
        self.entries.insert(pos, item);
        self.revision += 1;
        true
    }

    /// Removes the bookmark with `id`, if present.
    pub fn remove_by_id(&mut self, id: &BookmarkId) -> Option<Bookmark> {
        if !self.ids.remove(id) {
            return None;
        }
        let pos = self.entries.iter().position(|b| &b.id == id)?;
        self.revision += 1;
        Some(self.entries.remove(pos))
    }

    /// Applies a change event. Returns true if the store changed.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Created(row) => self.insert(row),
            ChangeEvent::Deleted { id } => self.remove_by_id(&id).is_some(),
        }
    }

    /// Returns a copy of the ordered contents.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.entries.clone()
    }

    /// Borrows the ordered contents.
    pub fn as_slice(&self) -> &[Bookmark] {
        &self.entries
    }

    /// Iterates over the bookmarks, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.entries.iter()
    }
}
