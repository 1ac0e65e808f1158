//! Data store contract consumed by the vault session.
//!
//! Implementations own durable storage of bookmark records. Every call is
//! scoped to one owner; a store never returns or mutates another user's rows.

use async_trait::async_trait;

use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch, RecordFilter, RecordId, SortOrder};
use crate::types::errors::StoreError;
use crate::types::identity::Identity;

/// Trait defining the bookmark store operations.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Lists the records matching `filter` in the requested order.
    async fn query(&self, filter: &RecordFilter, order: SortOrder) -> Result<Vec<Bookmark>, StoreError>;

    /// Inserts a new record and returns it with its store-assigned ID and timestamp.
    async fn insert(&self, owner: &Identity, draft: &BookmarkDraft) -> Result<Bookmark, StoreError>;

    /// Replaces title and URL of an existing record.
    async fn update(&self, owner: &Identity, id: &RecordId, patch: &BookmarkPatch) -> Result<Bookmark, StoreError>;

    /// Removes a record.
    async fn delete(&self, owner: &Identity, id: &RecordId) -> Result<(), StoreError>;
}
