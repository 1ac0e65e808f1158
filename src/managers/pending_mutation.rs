//! Per-mutation bookkeeping for optimistic changes.
//!
//! Every local create/update/delete becomes a [`PendingMutation`] that moves
//! from `Pending` to exactly one of `Confirmed` or `RolledBack`.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::bookmark::{Bookmark, BookmarkDraft, BookmarkPatch, RecordId};

/// Identifier of a local mutation awaiting the store's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(pub u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Confirmed,
    RolledBack,
}

/// What was changed locally and what is needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingKind {
    Create {
        draft: BookmarkDraft,
        /// Placeholder inserted into the collection (optimistic strategy only).
        placeholder: Option<RecordId>,
        /// Client timestamp the placeholder shows until confirmation.
        created_at: DateTime<Utc>,
        /// Store ID of the feed record that took over the placeholder, if any.
        adopted: Option<RecordId>,
    },
    Update {
        id: RecordId,
        snapshot: Bookmark,
        applied: Bookmark,
    },
    Delete {
        snapshot: Bookmark,
        position: usize,
        /// Whether the entry was taken out of the collection before confirmation.
        removed: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: PendingKind,
    pub state: MutationState,
}

impl PendingMutation {
    pub fn new(id: MutationId, kind: PendingKind) -> Self {
        Self {
            id,
            kind,
            state: MutationState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == MutationState::Pending
    }

    pub fn confirm(&mut self) {
        if self.is_pending() {
            self.state = MutationState::Confirmed;
        }
    }

    pub fn roll_back(&mut self) {
        if self.is_pending() {
            self.state = MutationState::RolledBack;
        }
    }

    /// The existing record this mutation targets (`None` for creates).
    pub fn target(&self) -> Option<&RecordId> {
        match &self.kind {
            PendingKind::Create { .. } => None,
            PendingKind::Update { id, .. } => Some(id),
            PendingKind::Delete { snapshot, .. } => Some(&snapshot.id),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            PendingKind::Create { .. } => "create",
            PendingKind::Update { .. } => "update",
            PendingKind::Delete { .. } => "delete",
        }
    }
}

/// The store call a mutation needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    Insert(BookmarkDraft),
    Update(RecordId, BookmarkPatch),
    Delete(RecordId),
}

/// The store's successful answer to a [`StoreRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreResponse {
    Inserted(Bookmark),
    Updated(Bookmark),
    Deleted,
}

/// Handed back by the view-model when a mutation starts.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationTicket {
    pub mutation: MutationId,
    pub request: StoreRequest,
    /// The entry as it now appears locally, if the change was applied optimistically.
    pub optimistic: Option<Bookmark>,
}
