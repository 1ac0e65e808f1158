use serde::{Deserialize, Serialize};

use super::bookmark::{Bookmark, RecordId};

/// A change notification delivered by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert(Bookmark),
    Update(Bookmark),
    Delete(RecordId),
}

impl ChangeEvent {
    /// Identifier of the row this event describes.
    pub fn record_id(&self) -> &RecordId {
        match self {
            ChangeEvent::Insert(b) | ChangeEvent::Update(b) => &b.id,
            ChangeEvent::Delete(id) => id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ChangeEvent::Insert(_) => "insert",
            ChangeEvent::Update(_) => "update",
            ChangeEvent::Delete(_) => "delete",
        }
    }
}

/// Which rows a change-feed subscriber wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub table: String,
    pub owner_id: String,
}

impl ChangeFilter {
    pub fn bookmarks_of(owner_id: &str) -> Self {
        Self {
            table: "bookmarks".to_string(),
            owner_id: owner_id.to_string(),
        }
    }

    pub fn matches(&self, table: &str, owner_id: &str) -> bool {
        self.table == table && self.owner_id == owner_id
    }
}

/// Opaque handle identifying one active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);
