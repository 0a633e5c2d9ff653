//! Change events announced by the remote service.
//!
//! Change events are delivered independently of the request that caused
//! them. They may arrive before or after that request returns, may be
//! delivered twice, and are not guaranteed to follow causal order across a
//! reconnect. Applying them to a [`BookmarkStore`](crate::BookmarkStore) is
//! idempotent for exactly that reason.

use crate::bookmark::Bookmark;
use crate::types::BookmarkId;

/// Type of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A row was inserted.
    Created,
    /// A row was deleted.
    Deleted,
}

/// A single change notification for one bookmark row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A row was inserted; carries the full stored row.
    Created(Bookmark),
    /// A row was deleted; carries only its identifier.
    Deleted {
        /// Identifier of the deleted row.
        id: BookmarkId,
    },
}

impl ChangeEvent {
    /// Creates a deletion event.
    pub fn deleted(id: impl Into<BookmarkId>) -> Self {
        Self::Deleted { id: id.into() }
    }

    /// Returns the kind of change.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Created(_) => ChangeKind::Created,
            ChangeEvent::Deleted { .. } => ChangeKind::Deleted,
        }
    }

    /// Returns the identifier of the affected row.
    pub fn id(&self) -> &BookmarkId {
        match self {
            ChangeEvent::Created(bookmark) => &bookmark.id,
            ChangeEvent::Deleted { id } => id,
        }
    }
}
