//! # MarkIt Core
//!
//! Bookmark model, in-memory store and search view for MarkIt.
//!
//! This crate provides:
//! - `Bookmark` and the validated `NewBookmark` draft
//! - URL normalization for user input
//! - `BookmarkStore`, the owner-scoped, newest-first collection
//! - `ChangeEvent`, the created/deleted notifications from the remote service
//! - `SearchView`, a case-insensitive filter over store snapshots
//!
//! This is a pure crate with no I/O operations.
//!
//! ## Key Invariants
//!
//! - A store holds bookmarks of exactly one owner
//! - Bookmark ids are unique within a store
//! - Store order is `created_at` descending, ties broken by id
//! - Inserts and removals are idempotent

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bookmark;
mod change;
mod error;
mod store;
mod types;
mod url;
mod view;

pub use bookmark::{Bookmark, NewBookmark};
pub use change::{ChangeEvent, ChangeKind};
pub use error::{CoreError, CoreResult};
pub use store::BookmarkStore;
pub use types::{BookmarkId, OwnerId};
pub use url::{has_known_scheme, normalize_url, DEFAULT_SCHEME, KNOWN_SCHEMES};
pub use view::{filter, matches, SearchView};

/// MarkIt version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
