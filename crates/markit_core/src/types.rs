//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bookmark identifier assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

impl BookmarkId {
    /// Wraps a service-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookmarkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookmarkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of the authenticated user that owns bookmarks.
///
/// The owner is the only access-scoping key: every query, subscription and
/// store is bound to exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wraps an identity supplied by the identity provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = BookmarkId::new("b1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"b1\"");

        let owner: OwnerId = serde_json::from_str("\"user-42\"").unwrap();
        assert_eq!(owner.as_str(), "user-42");
        assert_eq!(owner.to_string(), "user-42");
    }
}
