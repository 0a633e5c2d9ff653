//! Bookmark fixtures.
//!
//! Timestamps are whole seconds after a fixed epoch so ordering in tests is
//! fully determined by the `secs` argument.

use chrono::{DateTime, TimeZone, Utc};
use markit_core::{Bookmark, OwnerId};

/// Owner used by fixtures unless stated otherwise.
pub const TEST_OWNER: &str = "user-alice";

/// Second owner for cross-identity tests.
pub const OTHER_OWNER: &str = "user-bob";

/// Returns the default test owner.
pub fn owner() -> OwnerId {
    OwnerId::new(TEST_OWNER)
}

/// Returns the second test owner.
pub fn other_owner() -> OwnerId {
    OwnerId::new(OTHER_OWNER)
}

/// Returns a deterministic timestamp `secs` seconds after the fixture epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A bookmark of the default owner created at `at(secs)`.
pub fn bookmark(id: &str, secs: i64) -> Bookmark {
    BookmarkBuilder::new(id).created(secs).build()
}

/// Builder for fixture bookmarks.
#[derive(Debug, Clone)]
pub struct BookmarkBuilder {
    id: String,
    owner: OwnerId,
    title: Option<String>,
    url: Option<String>,
    secs: i64,
}

impl BookmarkBuilder {
    /// Starts a bookmark with the given id and default owner.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            owner: owner(),
            title: None,
            url: None,
            secs: 0,
        }
    }

    /// Sets the owner.
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = owner;
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the url.
    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Sets the creation time in seconds after the fixture epoch.
    pub fn created(mut self, secs: i64) -> Self {
        self.secs = secs;
        self
    }

    /// Builds the bookmark.
    pub fn build(self) -> Bookmark {
        let title = self.title.unwrap_or_else(|| format!("Bookmark {}", self.id));
        let url = self
            .url
            .unwrap_or_else(|| format!("https://{}.example.com", self.id));
        Bookmark::new(self.id, self.owner, title, url, at(self.secs))
    }
}
