//! Bookmark View-Model for Vault.
//!
//! Owns the canonical in-memory bookmark collection and keeps it consistent
//! across three inputs: the initial load, local user actions (applied
//! optimistically and later confirmed or rolled back), and the change feed.
//!
//! The collection is ordered by `created_at` descending and never holds two
//! entries with the same ID. A local create and its mirrored feed insert may
//! arrive in either order; both paths converge on a single entry.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::managers::pending_mutation::{
    MutationId, MutationTicket, PendingKind, PendingMutation, StoreRequest, StoreResponse,
};
use crate::services::bookmark_view::{compute_stats, filter_bookmarks};
use crate::services::url_normalizer::validate_input;
use crate::types::bookmark::{Bookmark, BookmarkPatch, RecordId};
use crate::types::change::ChangeEvent;
use crate::types::errors::{BookmarkError, StoreError};
use crate::types::settings::SyncStrategy;
use crate::types::stats::BookmarkStats;

/// How a remote change event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The collection changed.
    Applied,
    /// The record replaced the placeholder of a pending create.
    Adopted(MutationId),
    /// The event was redundant, stale or unknown; nothing changed.
    Ignored,
}

/// Marks the start of one reload; changes applied after it are replayed over
/// the reload's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadEpoch(u64);

/// Trait defining the view-model operations.
pub trait BookmarkViewModelTrait {
    fn load(&mut self, records: Vec<Bookmark>);
    fn begin_reload(&mut self) -> ReloadEpoch;
    fn finish_reload(&mut self, epoch: ReloadEpoch, records: Vec<Bookmark>);
    fn abandon_reload(&mut self, epoch: ReloadEpoch);
    fn begin_create(&mut self, title: &str, url: &str, now: DateTime<Utc>) -> Result<MutationTicket, BookmarkError>;
    fn begin_update(&mut self, id: &RecordId, title: &str, url: &str) -> Result<MutationTicket, BookmarkError>;
    fn begin_delete(&mut self, id: &RecordId) -> Result<MutationTicket, BookmarkError>;
    fn resolve(
        &mut self,
        mutation: MutationId,
        result: Result<StoreResponse, StoreError>,
    ) -> Result<Option<Bookmark>, BookmarkError>;
    fn apply_remote_event(&mut self, event: ChangeEvent) -> RemoteOutcome;
    fn bookmarks(&self) -> &[Bookmark];
    fn filter(&self, query: &str) -> Vec<Bookmark>;
    fn dispose(&mut self);
}

/// In-memory view-model over the signed-in user's bookmarks.
pub struct BookmarkViewModel {
    bookmarks: Vec<Bookmark>,
    pending: Vec<PendingMutation>,
    /// IDs the store has reported deleted; never re-added.
    tombstones: HashSet<RecordId>,
    /// Effects applied while a reload is in flight, tagged with a sequence number.
    journal: Vec<(u64, ChangeEvent)>,
    journal_seq: u64,
    reloads_in_flight: usize,
    strategy: SyncStrategy,
    next_mutation: u64,
    disposed: bool,
}

impl BookmarkViewModel {
    pub fn new(strategy: SyncStrategy) -> Self {
        Self {
            bookmarks: Vec::new(),
            pending: Vec::new(),
            tombstones: HashSet::new(),
            journal: Vec::new(),
            journal_seq: 0,
            reloads_in_flight: 0,
            strategy,
            next_mutation: 1,
            disposed: false,
        }
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| &b.id == id)
    }

    /// Mutations still waiting for the store, oldest first.
    pub fn pending(&self) -> &[PendingMutation] {
        &self.pending
    }

    pub fn stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> BookmarkStats {
        compute_stats(&self.bookmarks, now)
    }

    fn position_of(&self, id: &RecordId) -> Option<usize> {
        self.bookmarks.iter().position(|b| &b.id == id)
    }

    fn next_mutation_id(&mut self) -> MutationId {
        let id = MutationId(self.next_mutation);
        self.next_mutation += 1;
        id
    }

    fn ensure_live(&self) -> Result<(), BookmarkError> {
        if self.disposed {
            Err(BookmarkError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Rejects edits of placeholders and of rows with a delete in flight.
    fn ensure_editable(&self, id: &RecordId) -> Result<usize, BookmarkError> {
        if id.is_placeholder() {
            return Err(BookmarkError::Pending(id.to_string()));
        }
        let deleting = self
            .pending
            .iter()
            .any(|m| matches!(m.kind, PendingKind::Delete { .. }) && m.target() == Some(id));
        if deleting {
            return Err(BookmarkError::Pending(id.to_string()));
        }
        self.position_of(id)
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))
    }

    /// Remembers an applied change so an in-flight reload can replay it.
    fn record(&mut self, event: ChangeEvent) {
        if self.reloads_in_flight > 0 {
            self.journal.push((self.journal_seq, event));
            self.journal_seq += 1;
        }
    }

    /// Re-applies a journaled change on top of a reloaded collection.
    ///
    /// Unlike a live feed event, a replayed insert never adopts a placeholder.
    fn replay(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Insert(record) => {
                if self.position_of(&record.id).is_none() && !self.tombstones.contains(&record.id) {
                    self.bookmarks.insert(0, record);
                }
            }
            ChangeEvent::Update(record) => {
                if let Some(pos) = self.position_of(&record.id) {
                    self.bookmarks[pos] = record;
                }
            }
            ChangeEvent::Delete(id) => {
                self.bookmarks.retain(|b| b.id != id);
                self.tombstones.insert(id);
            }
        }
    }

    fn end_reload(&mut self) {
        self.reloads_in_flight = self.reloads_in_flight.saturating_sub(1);
        if self.reloads_in_flight == 0 {
            self.journal.clear();
        }
    }

    /// Number of deleted IDs still remembered.
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    fn sort_newest_first(bookmarks: &mut [Bookmark]) {
        // Stable sort keeps the store's order among equal timestamps.
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    /// Re-applies still-pending local changes on top of a freshly loaded collection.
    fn rebase_pending(&mut self) {
        let mut placeholders = Vec::new();
        for m in &self.pending {
            match &m.kind {
                PendingKind::Create {
                    draft,
                    placeholder: Some(pid),
                    created_at,
                    adopted: None,
                } => placeholders.push(Bookmark {
                    id: pid.clone(),
                    title: draft.title.clone(),
                    url: draft.url.clone(),
                    created_at: *created_at,
                }),
                PendingKind::Update { id, applied, .. } => {
                    if let Some(entry) = self.bookmarks.iter_mut().find(|b| &b.id == id) {
                        *entry = applied.clone();
                    }
                }
                PendingKind::Delete {
                    snapshot,
                    removed: true,
                    ..
                } => self.bookmarks.retain(|b| b.id != snapshot.id),
                _ => {}
            }
        }
        for placeholder in placeholders.into_iter().rev() {
            self.bookmarks.insert(0, placeholder);
        }
    }

    fn confirm_create(&mut self, mutation: &PendingMutation, record: Bookmark) -> Bookmark {
        let placeholder = match &mutation.kind {
            PendingKind::Create { placeholder, .. } => placeholder.clone(),
            _ => None,
        };
        let placeholder_pos = placeholder.as_ref().and_then(|p| self.position_of(p));

        if self.position_of(&record.id).is_some() || self.tombstones.contains(&record.id) {
            // The feed already delivered (or deleted) this record.
            if let Some(pos) = placeholder_pos {
                self.bookmarks.remove(pos);
            }
            debug!(mutation = %mutation.id, id = %record.id, "create confirmed after feed event");
        } else {
            match placeholder_pos {
                Some(pos) => {
                    self.bookmarks[pos] = record.clone();
                    debug!(mutation = %mutation.id, id = %record.id, "placeholder replaced by confirmed record");
                }
                None => {
                    self.bookmarks.insert(0, record.clone());
                    debug!(mutation = %mutation.id, id = %record.id, "confirmed record inserted");
                }
            }
            self.record(ChangeEvent::Insert(record.clone()));
        }
        record
    }

    fn confirm_update(&mut self, mutation: &PendingMutation, record: Bookmark) -> Bookmark {
        if let PendingKind::Update { id, applied, .. } = &mutation.kind {
            if let Some(pos) = self.position_of(id) {
                // A newer remote value already replaced the optimistic one.
                if &self.bookmarks[pos] == applied {
                    self.bookmarks[pos] = record.clone();
                    self.record(ChangeEvent::Update(record.clone()));
                }
            }
            for later in self.pending.iter_mut() {
                if let PendingKind::Update { id: other, snapshot, .. } = &mut later.kind {
                    if other == id && snapshot == applied {
                        *snapshot = record.clone();
                    }
                }
            }
        }
        record
    }

    fn confirm_delete(&mut self, mutation: &PendingMutation) {
        if let PendingKind::Delete { snapshot, .. } = &mutation.kind {
            self.bookmarks.retain(|b| b.id != snapshot.id);
            self.tombstones.insert(snapshot.id.clone());
            self.record(ChangeEvent::Delete(snapshot.id.clone()));
        }
    }

    fn roll_back(&mut self, mutation: &PendingMutation) {
        match &mutation.kind {
            PendingKind::Create {
                placeholder,
                adopted,
                ..
            } => {
                if adopted.is_none() {
                    if let Some(pid) = placeholder {
                        self.bookmarks.retain(|b| &b.id != pid);
                    }
                }
            }
            PendingKind::Update { id, snapshot, applied } => {
                if let Some(pos) = self.position_of(id) {
                    if &self.bookmarks[pos] == applied {
                        self.bookmarks[pos] = snapshot.clone();
                    }
                }
                for later in self.pending.iter_mut() {
                    if let PendingKind::Update {
                        id: other,
                        snapshot: later_snapshot,
                        ..
                    } = &mut later.kind
                    {
                        if other == id && later_snapshot == applied {
                            *later_snapshot = snapshot.clone();
                        }
                    }
                }
            }
            PendingKind::Delete {
                snapshot,
                position,
                removed,
            } => {
                let known = self.position_of(&snapshot.id).is_some();
                if *removed && !known && !self.tombstones.contains(&snapshot.id) {
                    let at = (*position).min(self.bookmarks.len());
                    self.bookmarks.insert(at, snapshot.clone());
                }
            }
        }
    }

    /// Oldest pending create whose placeholder shows the same content as `record`.
    fn adoptable_create(&self, record: &Bookmark) -> Option<usize> {
        self.pending.iter().position(|m| match &m.kind {
            PendingKind::Create {
                draft,
                placeholder: Some(pid),
                adopted: None,
                ..
            } => record.matches_draft(draft) && self.position_of(pid).is_some(),
            _ => false,
        })
    }
}

impl Default for BookmarkViewModel {
    fn default() -> Self {
        Self::new(SyncStrategy::Optimistic)
    }
}

impl BookmarkViewModelTrait for BookmarkViewModel {
    /// Replaces the collection with `records`, newest first, keeping the first
    /// occurrence of any repeated ID. Pending local changes are re-applied.
    fn load(&mut self, records: Vec<Bookmark>) {
        if self.disposed {
            return;
        }
        let mut seen = HashSet::new();
        let mut records: Vec<Bookmark> = records
            .into_iter()
            .filter(|b| seen.insert(b.id.clone()))
            .collect();
        Self::sort_newest_first(&mut records);
        if self.pending.is_empty() {
            // Nothing can resurrect an ID the fresh snapshot no longer holds.
            let live: HashSet<&RecordId> = records.iter().map(|b| &b.id).collect();
            self.tombstones.retain(|id| live.contains(id));
        }
        self.bookmarks = records;
        self.rebase_pending();
        debug!(count = self.bookmarks.len(), "collection loaded");
    }

    /// Starts journaling applied changes until the matching reload ends.
    fn begin_reload(&mut self) -> ReloadEpoch {
        self.reloads_in_flight += 1;
        ReloadEpoch(self.journal_seq)
    }

    /// Loads a snapshot queried after `epoch` began, then replays every change
    /// applied since, so nothing newer than the snapshot is lost.
    fn finish_reload(&mut self, epoch: ReloadEpoch, records: Vec<Bookmark>) {
        if self.disposed {
            return;
        }
        let since: Vec<ChangeEvent> = self
            .journal
            .iter()
            .filter(|(seq, _)| *seq >= epoch.0)
            .map(|(_, event)| event.clone())
            .collect();
        self.load(records);
        let replayed = since.len();
        for event in since {
            self.replay(event);
        }
        self.end_reload();
        debug!(replayed, count = self.bookmarks.len(), "reload applied");
    }

    fn abandon_reload(&mut self, _epoch: ReloadEpoch) {
        self.end_reload();
    }

    fn begin_create(&mut self, title: &str, url: &str, now: DateTime<Utc>) -> Result<MutationTicket, BookmarkError> {
        let draft = validate_input(title, url)?;
        self.ensure_live()?;
        let mutation = self.next_mutation_id();

        let optimistic = match self.strategy {
            SyncStrategy::Optimistic => {
                let placeholder = Bookmark::placeholder(&draft, now);
                self.bookmarks.insert(0, placeholder.clone());
                Some(placeholder)
            }
            SyncStrategy::Pessimistic => None,
        };

        self.pending.push(PendingMutation::new(
            mutation,
            PendingKind::Create {
                draft: draft.clone(),
                placeholder: optimistic.as_ref().map(|b| b.id.clone()),
                created_at: now,
                adopted: None,
            },
        ));

        Ok(MutationTicket {
            mutation,
            request: StoreRequest::Insert(draft),
            optimistic,
        })
    }

    fn begin_update(&mut self, id: &RecordId, title: &str, url: &str) -> Result<MutationTicket, BookmarkError> {
        let draft = validate_input(title, url)?;
        self.ensure_live()?;
        let pos = self.ensure_editable(id)?;
        let mutation = self.next_mutation_id();

        let snapshot = self.bookmarks[pos].clone();
        let applied = Bookmark {
            title: draft.title.clone(),
            url: draft.url.clone(),
            ..snapshot.clone()
        };
        self.bookmarks[pos] = applied.clone();

        self.pending.push(PendingMutation::new(
            mutation,
            PendingKind::Update {
                id: id.clone(),
                snapshot,
                applied: applied.clone(),
            },
        ));

        Ok(MutationTicket {
            mutation,
            request: StoreRequest::Update(id.clone(), BookmarkPatch::from(draft)),
            optimistic: Some(applied),
        })
    }

    fn begin_delete(&mut self, id: &RecordId) -> Result<MutationTicket, BookmarkError> {
        self.ensure_live()?;
        let pos = self.ensure_editable(id)?;
        let mutation = self.next_mutation_id();

        let removed = self.strategy == SyncStrategy::Optimistic;
        let snapshot = if removed {
            self.bookmarks.remove(pos)
        } else {
            self.bookmarks[pos].clone()
        };

        self.pending.push(PendingMutation::new(
            mutation,
            PendingKind::Delete {
                snapshot,
                position: pos,
                removed,
            },
        ));

        Ok(MutationTicket {
            mutation,
            request: StoreRequest::Delete(id.clone()),
            optimistic: None,
        })
    }

    /// Settles a pending mutation with the store's answer.
    ///
    /// On success returns the canonical record (for creates and updates). On
    /// failure the optimistic change is undone and the store's error is returned.
    /// Answers for unknown or already settled mutations are ignored.
    fn resolve(
        &mut self,
        mutation: MutationId,
        result: Result<StoreResponse, StoreError>,
    ) -> Result<Option<Bookmark>, BookmarkError> {
        self.ensure_live()?;
        let index = match self.pending.iter().position(|m| m.id == mutation) {
            Some(index) => index,
            None => {
                debug!(mutation = %mutation, "ignoring answer for unknown mutation");
                return Ok(None);
            }
        };
        let mut pending = self.pending.remove(index);

        let outcome = match (&pending.kind, result) {
            (PendingKind::Create { .. }, Ok(StoreResponse::Inserted(record))) => {
                Ok(Some(self.confirm_create(&pending, record)))
            }
            (PendingKind::Update { .. }, Ok(StoreResponse::Updated(record))) => {
                Ok(Some(self.confirm_update(&pending, record)))
            }
            (PendingKind::Delete { .. }, Ok(StoreResponse::Deleted)) => {
                self.confirm_delete(&pending);
                Ok(None)
            }
            (_, Err(err)) => Err(BookmarkError::from(err)),
            (_, Ok(other)) => Err(BookmarkError::StoreRejected(format!(
                "unexpected store response {:?} to {}",
                other,
                pending.kind_name()
            ))),
        };

        match &outcome {
            Ok(_) => pending.confirm(),
            Err(err) => {
                self.roll_back(&pending);
                pending.roll_back();
                warn!(mutation = %mutation, kind = pending.kind_name(), error = %err, "mutation rolled back");
            }
        }
        debug!(mutation = %mutation, state = ?pending.state, "mutation settled");
        outcome
    }

    fn apply_remote_event(&mut self, event: ChangeEvent) -> RemoteOutcome {
        if self.disposed {
            return RemoteOutcome::Ignored;
        }
        self.record(event.clone());
        let outcome = match event {
            ChangeEvent::Insert(record) => {
                if self.position_of(&record.id).is_some() || self.tombstones.contains(&record.id) {
                    RemoteOutcome::Ignored
                } else if let Some(index) = self.adoptable_create(&record) {
                    let m = &mut self.pending[index];
                    let mutation = m.id;
                    let mut adopted_pos = None;
                    if let PendingKind::Create {
                        placeholder: Some(pid),
                        adopted,
                        ..
                    } = &mut m.kind
                    {
                        *adopted = Some(record.id.clone());
                        adopted_pos = self.bookmarks.iter().position(|b| &b.id == pid);
                    }
                    match adopted_pos {
                        Some(pos) => self.bookmarks[pos] = record,
                        None => self.bookmarks.insert(0, record),
                    }
                    RemoteOutcome::Adopted(mutation)
                } else {
                    self.bookmarks.insert(0, record);
                    RemoteOutcome::Applied
                }
            }
            ChangeEvent::Update(record) => {
                for m in self.pending.iter_mut() {
                    if let PendingKind::Delete { snapshot, .. } = &mut m.kind {
                        if snapshot.id == record.id {
                            *snapshot = record.clone();
                        }
                    }
                }
                match self.position_of(&record.id) {
                    Some(pos) if self.bookmarks[pos] == record => RemoteOutcome::Ignored,
                    Some(pos) => {
                        self.bookmarks[pos] = record;
                        RemoteOutcome::Applied
                    }
                    None => RemoteOutcome::Ignored,
                }
            }
            ChangeEvent::Delete(id) => {
                self.tombstones.insert(id.clone());
                match self.position_of(&id) {
                    Some(pos) => {
                        self.bookmarks.remove(pos);
                        RemoteOutcome::Applied
                    }
                    None => RemoteOutcome::Ignored,
                }
            }
        };
        debug!(outcome = ?outcome, "remote event applied");
        outcome
    }

    fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn filter(&self, query: &str) -> Vec<Bookmark> {
        filter_bookmarks(&self.bookmarks, query)
    }

    /// Marks the view-model dead; later answers and events no longer touch state.
    fn dispose(&mut self) {
        self.disposed = true;
        self.pending.clear();
        self.journal.clear();
    }
}
