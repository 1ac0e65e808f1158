use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Prefix of client-assigned identifiers held by unconfirmed bookmarks.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

/// Identifier of a bookmark record.
///
/// Stores may hand identifiers out as JSON numbers or strings; both are kept
/// in a normalized string form so that `42` and `"42"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Generates a fresh client-side placeholder identifier.
    pub fn placeholder() -> Self {
        Self(format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4()))
    }

    /// Returns `true` for identifiers minted locally before store confirmation.
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Signed(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Signed(n) => RecordId::from(n),
            RawId::Unsigned(n) => RecordId::from(n),
            RawId::Text(s) => RecordId::new(s),
        })
    }
}

/// A saved bookmark as held by the view-model and returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: RecordId,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Builds an unconfirmed bookmark from a validated draft.
    pub fn placeholder(draft: &BookmarkDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::placeholder(),
            title: draft.title.clone(),
            url: draft.url.clone(),
            created_at,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_placeholder()
    }

    /// Whether this record carries the same user-visible content as `draft`.
    pub fn matches_draft(&self, draft: &BookmarkDraft) -> bool {
        self.title == draft.title && self.url == draft.url
    }
}

/// Validated, normalized input for a new bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
}

/// Validated, normalized replacement fields for an existing bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkPatch {
    pub title: String,
    pub url: String,
}

impl From<BookmarkDraft> for BookmarkPatch {
    fn from(draft: BookmarkDraft) -> Self {
        Self {
            title: draft.title,
            url: draft.url,
        }
    }
}

/// Ordering requested from the store when listing bookmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Record filter passed to the store; every query is scoped to one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub owner_id: String,
}
