//! Local store backed by SQLite.
//!
//! Implements [`DataStore`] and doubles as the [`ChangeFeed`]: every committed
//! mutation is published to the subscribers whose filter matches the owner of
//! the affected row, mirroring what a hosted backend's realtime channel does.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, ErrorCode};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::connection::Database;
use crate::services::change_feed::{ChangeFeed, Subscription};
use crate::services::data_store::DataStore;
use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch, RecordFilter, RecordId, SortOrder};
use crate::types::change::{ChangeEvent, ChangeFilter, SubscriptionHandle};
use crate::types::errors::{FeedError, StoreError};
use crate::types::identity::Identity;

const TABLE: &str = "bookmarks";

struct Subscriber {
    filter: ChangeFilter,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// SQLite-backed bookmark store with an in-process change feed.
pub struct LocalStore {
    db: Mutex<Database>,
    subscribers: Mutex<HashMap<SubscriptionHandle, Subscriber>>,
    next_handle: AtomicU64,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            subscribers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn timestamp(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let id: String = row.get(0)?;
        let created_at: String = row.get(3)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?;
        Ok(Bookmark {
            id: RecordId::new(id),
            title: row.get(1)?,
            url: row.get(2)?,
            created_at,
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("database lock poisoned: {}", e)))?;
        f(&db)
    }

    /// Constraint violations are the store refusing the row; anything else means it is unusable.
    fn map_write_error(err: rusqlite::Error) -> StoreError {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Rejected(msg.clone().unwrap_or_else(|| "constraint violation".to_string()))
            }
            _ => StoreError::from(err),
        }
    }

    fn fetch(db: &Database, owner_id: &str, id: &RecordId) -> Result<Option<Bookmark>, StoreError> {
        let mut stmt = db
            .connection()
            .prepare("SELECT id, title, url, created_at FROM bookmarks WHERE id = ?1 AND user_id = ?2")?;
        let mut rows = stmt.query_map(params![id.as_str(), owner_id], Self::row_to_bookmark)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Called with the database lock held, so events leave in commit order.
    fn publish(&self, owner_id: &str, event: ChangeEvent) {
        let mut subscribers = match self.subscribers.lock() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "change feed lock poisoned; dropping event");
                return;
            }
        };
        // Receivers dropped without unsubscribing are pruned here.
        subscribers.retain(|handle, sub| {
            if !sub.filter.matches(TABLE, owner_id) {
                return true;
            }
            let delivered = sub.sender.send(event.clone()).is_ok();
            if !delivered {
                debug!(handle = handle.0, "pruning closed subscription");
            }
            delivered
        });
    }
}

#[async_trait]
impl DataStore for LocalStore {
    async fn query(&self, filter: &RecordFilter, order: SortOrder) -> Result<Vec<Bookmark>, StoreError> {
        let sql = match order {
            SortOrder::NewestFirst => {
                "SELECT id, title, url, created_at FROM bookmarks WHERE user_id = ?1 \
                 ORDER BY created_at DESC, rowid DESC"
            }
            SortOrder::OldestFirst => {
                "SELECT id, title, url, created_at FROM bookmarks WHERE user_id = ?1 \
                 ORDER BY created_at ASC, rowid ASC"
            }
        };
        self.with_db(|db| {
            let mut stmt = db.connection().prepare(sql)?;
            let rows = stmt.query_map(params![filter.owner_id], Self::row_to_bookmark)?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
    }

    async fn insert(&self, owner: &Identity, draft: &BookmarkDraft) -> Result<Bookmark, StoreError> {
        let bookmark = Bookmark {
            id: RecordId::new(Uuid::new_v4().to_string()),
            title: draft.title.clone(),
            url: draft.url.clone(),
            // Matches the precision stored in the created_at column.
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.with_db(|db| {
            db.connection()
                .execute(
                    "INSERT INTO bookmarks (id, user_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        bookmark.id.as_str(),
                        owner.id,
                        bookmark.title,
                        bookmark.url,
                        Self::timestamp(&bookmark.created_at)
                    ],
                )
                .map_err(Self::map_write_error)?;
            debug!(id = %bookmark.id, owner = %owner.id, "bookmark inserted");
            self.publish(&owner.id, ChangeEvent::Insert(bookmark.clone()));
            Ok(())
        })?;
        Ok(bookmark)
    }

    async fn update(&self, owner: &Identity, id: &RecordId, patch: &BookmarkPatch) -> Result<Bookmark, StoreError> {
        let updated = self.with_db(|db| {
            let affected = db
                .connection()
                .execute(
                    "UPDATE bookmarks SET title = ?1, url = ?2 WHERE id = ?3 AND user_id = ?4",
                    params![patch.title, patch.url, id.as_str(), owner.id],
                )
                .map_err(Self::map_write_error)?;
            if affected == 0 {
                return Err(StoreError::Rejected(format!("Bookmark not found: {}", id)));
            }
            let updated = Self::fetch(db, &owner.id, id)?
                .ok_or_else(|| StoreError::Rejected(format!("Bookmark not found: {}", id)))?;
            debug!(id = %id, owner = %owner.id, "bookmark updated");
            self.publish(&owner.id, ChangeEvent::Update(updated.clone()));
            Ok(updated)
        })?;
        Ok(updated)
    }

    async fn delete(&self, owner: &Identity, id: &RecordId) -> Result<(), StoreError> {
        self.with_db(|db| {
            let affected = db
                .connection()
                .execute(
                    "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                    params![id.as_str(), owner.id],
                )
                .map_err(Self::map_write_error)?;
            if affected == 0 {
                return Err(StoreError::Rejected(format!("Bookmark not found: {}", id)));
            }
            debug!(id = %id, owner = %owner.id, "bookmark deleted");
            self.publish(&owner.id, ChangeEvent::Delete(id.clone()));
            Ok(())
        })
    }
}

impl ChangeFeed for LocalStore {
    fn subscribe(&self, filter: ChangeFilter) -> Result<Subscription, FeedError> {
        if filter.table != TABLE {
            return Err(FeedError::SubscribeFailed(format!("unknown table: {}", filter.table)));
        }
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (sender, events) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .map_err(|e| FeedError::SubscribeFailed(e.to_string()))?
            .insert(handle, Subscriber { filter, sender });
        debug!(handle = handle.0, "change feed subscription opened");
        Ok(Subscription { handle, events })
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            if subscribers.remove(&handle).is_some() {
                debug!(handle = handle.0, "change feed subscription closed");
            }
        }
    }
}
