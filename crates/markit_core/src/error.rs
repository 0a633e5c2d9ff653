//! Error types for MarkIt core.

use crate::types::OwnerId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when building or storing bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Title was empty after trimming.
    #[error("bookmark title must not be empty")]
    EmptyTitle,

    /// URL was empty after trimming.
    #[error("bookmark url must not be empty")]
    EmptyUrl,

    /// A bookmark belongs to a different owner than the store.
    #[error("bookmark belongs to {found}, store is scoped to {expected}")]
    ForeignOwner {
        /// Owner the store is scoped to.
        expected: OwnerId,
        /// Owner found on the bookmark.
        found: OwnerId,
    },
}
