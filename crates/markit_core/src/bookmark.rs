//! The bookmark entity and its creation draft.

use crate::error::{CoreError, CoreResult};
use crate::types::{BookmarkId, OwnerId};
use crate::url::normalize_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A saved bookmark as confirmed by the remote service.
///
/// Bookmarks are never edited in place. The `id` and `created_at` fields are
/// assigned by the service at insert time; `owner` is serialized as
/// `user_id` to match the hosted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Service-assigned identifier.
    pub id: BookmarkId,
    /// Owning identity.
    #[serde(rename = "user_id")]
    pub owner: OwnerId,
    /// Normalized URL.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Service-assigned insert timestamp.
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Creates a bookmark from its stored fields.
    pub fn new(
        id: impl Into<BookmarkId>,
        owner: OwnerId,
        title: impl Into<String>,
        url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner,
            url: url.into(),
            title: title.into(),
            created_at,
        }
    }

    /// Display order: newest first, ties broken by descending id.
    pub fn newest_first(a: &Bookmark, b: &Bookmark) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// A validated request to create a bookmark.
///
/// Only the fields the client supplies are present; the service fills in
/// the rest and announces the stored row through a change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    /// Owning identity (the current session).
    #[serde(rename = "user_id")]
    pub owner: OwnerId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Normalized, non-empty URL.
    pub url: String,
}

impl NewBookmark {
    /// Validates and normalizes user input.
    ///
    /// The title is trimmed and must not be empty. The URL is normalized
    /// with [`normalize_url`] and must not be empty.
    pub fn new(owner: OwnerId, title: &str, url: &str) -> CoreResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::EmptyTitle);
        }

        let url = normalize_url(url);
        if url.is_empty() {
            return Err(CoreError::EmptyUrl);
        }

        Ok(Self {
            owner,
            title: title.to_string(),
            url,
        })
    }

    /// Materializes the draft as a stored row.
    pub fn into_bookmark(self, id: impl Into<BookmarkId>, created_at: DateTime<Utc>) -> Bookmark {
        Bookmark::new(id, self.owner, self.title, self.url, created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    #[test]
    fn draft_normalizes_url() {
        let draft = NewBookmark::new(owner(), "Example", "example.com").unwrap();
        assert_eq!(draft.url, "https://example.com");
        assert_eq!(draft.title, "Example");

        let draft = NewBookmark::new(owner(), "Example", "https://example.com").unwrap();
        assert_eq!(draft.url, "https://example.com");
    }

    #[test]
    fn draft_rejects_empty_fields() {
        assert_eq!(
            NewBookmark::new(owner(), "  ", "example.com"),
            Err(CoreError::EmptyTitle)
        );
        assert_eq!(
            NewBookmark::new(owner(), "Example", " "),
            Err(CoreError::EmptyUrl)
        );
    }

    #[test]
    fn newest_first_ordering() {
        let older = Bookmark::new(
            "a",
            owner(),
            "Old",
            "https://old.example",
            Utc.timestamp_opt(100, 0).unwrap(),
        );
        let newer = Bookmark::new(
            "b",
            owner(),
            "New",
            "https://new.example",
            Utc.timestamp_opt(200, 0).unwrap(),
        );
        assert_eq!(Bookmark::newest_first(&newer, &older), Ordering::Less);
        assert_eq!(Bookmark::newest_first(&older, &newer), Ordering::Greater);

        let twin = Bookmark::new("c", owner(), "Twin", "https://twin.example", older.created_at);
        assert_eq!(Bookmark::newest_first(&twin, &older), Ordering::Less);
    }

    #[test]
    fn wire_format_uses_user_id() {
        let row = r#"{
            "id": "b1",
            "user_id": "alice",
            "url": "https://example.com",
            "title": "Example",
            "created_at": "2024-05-01T12:00:00Z"
        }"#;
        let bookmark: Bookmark = serde_json::from_str(row).unwrap();
        assert_eq!(bookmark.id.as_str(), "b1");
        assert_eq!(bookmark.owner, owner());

        let draft = NewBookmark::new(owner(), "Example", "example.com").unwrap();
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["user_id"], "alice");
        assert_eq!(json["url"], "https://example.com");
    }
}
