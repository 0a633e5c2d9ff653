//! Search/filter view over store snapshots.
//!
//! The view is a pure derivation: it holds the query text only and is
//! recomputed from a fresh snapshot whenever the query or the store changes.

use crate::bookmark::Bookmark;

/// Returns true if `bookmark`'s title or url contains `needle`.
///
/// `needle` must already be lowercased.
fn contains_lowered(bookmark: &Bookmark, needle: &str) -> bool {
    bookmark.title.to_lowercase().contains(needle) || bookmark.url.to_lowercase().contains(needle)
}

/// Returns true if `bookmark` matches `query` (case-insensitive substring of
/// title or url). A blank query matches everything.
pub fn matches(bookmark: &Bookmark, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || contains_lowered(bookmark, &needle)
}

/// Filters `items` by `query`, preserving order.
pub fn filter<'a>(items: &'a [Bookmark], query: &str) -> Vec<&'a Bookmark> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|b| contains_lowered(b, &needle))
        .collect()
}

/// A search query applied to store snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    query: String,
}

impl SearchView {
    /// Creates a view with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Returns the current query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query. Returns true if it changed.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        self.query = query;
        true
    }

    /// Returns true if no filtering is applied.
    pub fn is_unfiltered(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Projects `snapshot` through the query.
    pub fn apply<'a>(&self, snapshot: &'a [Bookmark]) -> Vec<&'a Bookmark> {
        filter(snapshot, &self.query)
    }

    /// Projects `snapshot` through the query, returning owned rows.
    pub fn apply_owned(&self, snapshot: &[Bookmark]) -> Vec<Bookmark> {
        self.apply(snapshot).into_iter().cloned().collect()
    }
}
