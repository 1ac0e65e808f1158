//! Vault Session: the async driver around [`BookmarkViewModel`].
//!
//! A session resolves the signed-in user, subscribes to the change feed, loads
//! the initial collection and then runs a single event loop that owns the
//! view-model. Handle calls, store answers and feed events are all funnelled
//! through that loop, so the collection is never touched concurrently.
//!
//! The current collection is published through a `watch` channel; readers
//! (`snapshot`, `filter`, `stats`, `subscribe_changes`) never wait on the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::managers::bookmark_view_model::{BookmarkViewModel, BookmarkViewModelTrait, ReloadEpoch, RemoteOutcome};
use crate::managers::pending_mutation::{MutationId, MutationTicket, StoreRequest, StoreResponse};
use crate::services::bookmark_view::{compute_stats, filter_bookmarks};
use crate::services::change_feed::ChangeFeed;
use crate::services::data_store::DataStore;
use crate::services::identity_service::IdentityService;
use crate::types::bookmark::{Bookmark, RecordFilter, RecordId, SortOrder};
use crate::types::change::{ChangeEvent, ChangeFilter, SubscriptionHandle};
use crate::types::errors::{BookmarkError, SessionError, StoreError};
use crate::types::identity::Identity;
use crate::types::settings::{SyncSettings, SyncStrategy};
use crate::types::stats::{BookmarkStats, SyncStatus};

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub strategy: SyncStrategy,
    /// How long `sync_status()` reports `Syncing` after a remote change.
    pub sync_indicator: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

impl SessionOptions {
    pub fn from_settings(sync: &SyncSettings) -> Self {
        Self {
            strategy: sync.strategy,
            sync_indicator: Duration::from_millis(sync.sync_indicator_ms),
        }
    }
}

type RecordReply = oneshot::Sender<Result<Bookmark, BookmarkError>>;
type UnitReply = oneshot::Sender<Result<(), BookmarkError>>;
type LoadReply = oneshot::Sender<Result<usize, BookmarkError>>;

enum Command {
    Create { title: String, url: String, reply: RecordReply },
    Update { id: RecordId, title: String, url: String, reply: RecordReply },
    Delete { id: RecordId, reply: UnitReply },
    Reload { reply: LoadReply },
    Shutdown,
}

/// Waiting caller of a mutation.
enum Reply {
    Record(RecordReply),
    Unit(UnitReply),
}

impl Reply {
    fn send(self, outcome: Result<Option<Bookmark>, BookmarkError>) {
        // A caller that stopped waiting is not an error.
        match self {
            Reply::Record(tx) => {
                let _ = tx.send(outcome.and_then(|record| record.ok_or(BookmarkError::SessionClosed)));
            }
            Reply::Unit(tx) => {
                let _ = tx.send(outcome.map(|_| ()));
            }
        }
    }
}

enum TaskOutput {
    Mutation(MutationId, Result<StoreResponse, StoreError>),
    Loaded {
        epoch: ReloadEpoch,
        result: Result<Vec<Bookmark>, StoreError>,
        reply: LoadReply,
    },
}

/// A live view over one user's bookmarks.
pub struct VaultSession {
    owner: Identity,
    commands: mpsc::UnboundedSender<Command>,
    collection: watch::Receiver<Vec<Bookmark>>,
    status: watch::Receiver<SyncStatus>,
    load_error: Arc<Mutex<Option<BookmarkError>>>,
    alive: Arc<AtomicBool>,
    feed: Arc<dyn ChangeFeed>,
    subscription: SubscriptionHandle,
}

impl VaultSession {
    /// Starts a session for the currently signed-in user.
    ///
    /// # Errors
    /// `AuthRequired` without an identity, `Feed` if the subscription fails.
    /// A failed initial load is not fatal; see [`VaultSession::load_error`].
    pub async fn start(
        identity: Arc<dyn IdentityService>,
        store: Arc<dyn DataStore>,
        feed: Arc<dyn ChangeFeed>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let owner = identity.current_user().await.ok_or(SessionError::AuthRequired)?;
        let subscription = feed.subscribe(ChangeFilter::bookmarks_of(&owner.id))?;

        let mut view_model = BookmarkViewModel::new(options.strategy);
        let filter = RecordFilter {
            owner_id: owner.id.clone(),
        };
        let load_error = match store.query(&filter, SortOrder::NewestFirst).await {
            Ok(records) => {
                view_model.load(records);
                None
            }
            Err(err) => {
                warn!(owner = %owner.id, error = %err, "initial bookmark load failed");
                Some(BookmarkError::from(err))
            }
        };

        let (collection_tx, collection) = watch::channel(view_model.bookmarks().to_vec());
        let (status_tx, status) = watch::channel(SyncStatus::Synced);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let load_error = Arc::new(Mutex::new(load_error));
        let alive = Arc::new(AtomicBool::new(true));

        let event_loop = SessionLoop {
            view_model,
            store,
            owner: owner.clone(),
            collection_tx,
            status_tx,
            load_error: Arc::clone(&load_error),
            alive: Arc::clone(&alive),
            replies: HashMap::new(),
            in_flight: JoinSet::new(),
            sync_indicator: options.sync_indicator,
            sync_deadline: None,
        };
        tokio::spawn(event_loop.run(command_rx, Some(subscription.events)));

        info!(owner = %owner.id, strategy = ?options.strategy, "vault session started");
        Ok(Self {
            owner,
            commands,
            collection,
            status,
            load_error,
            alive,
            feed,
            subscription: subscription.handle,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.owner
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(SessionError::Disposed)
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, BookmarkError>>) -> Command,
    ) -> Result<T, SessionError> {
        self.ensure_alive()?;
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| SessionError::Disposed)?;
        rx.await
            .map_err(|_| SessionError::Disposed)?
            .map_err(SessionError::from)
    }

    /// Adds a bookmark and resolves with the stored record.
    pub async fn create(&self, title: &str, url: &str) -> Result<Bookmark, SessionError> {
        let (title, url) = (title.to_string(), url.to_string());
        self.request(|reply| Command::Create { title, url, reply }).await
    }

    pub async fn update(&self, id: &RecordId, title: &str, url: &str) -> Result<Bookmark, SessionError> {
        let (id, title, url) = (id.clone(), title.to_string(), url.to_string());
        self.request(|reply| Command::Update { id, title, url, reply }).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), SessionError> {
        let id = id.clone();
        self.request(|reply| Command::Delete { id, reply }).await
    }

    /// Re-queries the store and replaces the collection. Returns the new size.
    pub async fn reload(&self) -> Result<usize, SessionError> {
        self.request(|reply| Command::Reload { reply }).await
    }

    /// The collection as last published by the event loop.
    pub fn snapshot(&self) -> Result<Vec<Bookmark>, SessionError> {
        self.ensure_alive()?;
        Ok(self.collection.borrow().clone())
    }

    pub fn filter(&self, query: &str) -> Result<Vec<Bookmark>, SessionError> {
        self.ensure_alive()?;
        Ok(filter_bookmarks(&self.collection.borrow(), query))
    }

    /// Stats with "today" taken in the local time zone.
    pub fn stats(&self) -> Result<BookmarkStats, SessionError> {
        self.stats_at(&Local::now())
    }

    pub fn stats_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<BookmarkStats, SessionError> {
        self.ensure_alive()?;
        Ok(compute_stats(&self.collection.borrow(), now))
    }

    /// Receiver that is notified every time the collection changes.
    pub fn subscribe_changes(&self) -> Result<watch::Receiver<Vec<Bookmark>>, SessionError> {
        self.ensure_alive()?;
        Ok(self.collection.clone())
    }

    pub fn sync_status(&self) -> Result<SyncStatus, SessionError> {
        self.ensure_alive()?;
        Ok(*self.status.borrow())
    }

    /// The error of the most recent failed load, cleared by a successful reload.
    pub fn load_error(&self) -> Option<BookmarkError> {
        self.load_error.lock().ok().and_then(|guard| guard.clone())
    }

    /// Tears the session down. Idempotent.
    pub fn dispose(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        self.feed.unsubscribe(self.subscription);
        // The loop may already be gone if the runtime shut down.
        let _ = self.commands.send(Command::Shutdown);
        info!(owner = %self.owner.id, "vault session disposed");
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn next_event(feed: &mut Option<mpsc::UnboundedReceiver<ChangeEvent>>) -> Option<ChangeEvent> {
    match feed {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

struct SessionLoop {
    view_model: BookmarkViewModel,
    store: Arc<dyn DataStore>,
    owner: Identity,
    collection_tx: watch::Sender<Vec<Bookmark>>,
    status_tx: watch::Sender<SyncStatus>,
    load_error: Arc<Mutex<Option<BookmarkError>>>,
    alive: Arc<AtomicBool>,
    replies: HashMap<MutationId, Reply>,
    in_flight: JoinSet<TaskOutput>,
    sync_indicator: Duration,
    sync_deadline: Option<Instant>,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut feed_events: Option<mpsc::UnboundedReceiver<ChangeEvent>>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.handle_joined(joined);
                }
                event = next_event(&mut feed_events) => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        warn!(owner = %self.owner.id, "change feed closed; remote changes will not be applied");
                        feed_events = None;
                    }
                },
                _ = sleep_until_deadline(self.sync_deadline) => {
                    self.sync_deadline = None;
                    self.refresh_status();
                }
            }
        }
        self.shut_down();
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Create { title, url, reply } => {
                match self.view_model.begin_create(&title, &url, Utc::now()) {
                    Ok(ticket) => self.dispatch(ticket, Reply::Record(reply)),
                    Err(err) => {
                        let _ = reply.send(Err(err));
                    }
                }
            }
            Command::Update { id, title, url, reply } => {
                match self.view_model.begin_update(&id, &title, &url) {
                    Ok(ticket) => self.dispatch(ticket, Reply::Record(reply)),
                    Err(err) => {
                        let _ = reply.send(Err(err));
                    }
                }
            }
            Command::Delete { id, reply } => match self.view_model.begin_delete(&id) {
                Ok(ticket) => self.dispatch(ticket, Reply::Unit(reply)),
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            Command::Reload { reply } => {
                let epoch = self.view_model.begin_reload();
                let store = Arc::clone(&self.store);
                let filter = RecordFilter {
                    owner_id: self.owner.id.clone(),
                };
                self.in_flight.spawn(async move {
                    let result = store.query(&filter, SortOrder::NewestFirst).await;
                    TaskOutput::Loaded { epoch, result, reply }
                });
                self.refresh_status();
            }
            Command::Shutdown => {}
        }
    }

    /// Publishes the optimistic state and sends the store call off.
    fn dispatch(&mut self, ticket: MutationTicket, reply: Reply) {
        let MutationTicket { mutation, request, .. } = ticket;
        debug!(mutation = %mutation, request = ?request, "dispatching store call");
        self.replies.insert(mutation, reply);

        let store = Arc::clone(&self.store);
        let owner = self.owner.clone();
        self.in_flight.spawn(async move {
            let result = match request {
                StoreRequest::Insert(draft) => store.insert(&owner, &draft).await.map(StoreResponse::Inserted),
                StoreRequest::Update(id, patch) => {
                    store.update(&owner, &id, &patch).await.map(StoreResponse::Updated)
                }
                StoreRequest::Delete(id) => store.delete(&owner, &id).await.map(|_| StoreResponse::Deleted),
            };
            TaskOutput::Mutation(mutation, result)
        });

        self.publish();
        self.refresh_status();
    }

    fn handle_joined(&mut self, joined: Result<TaskOutput, JoinError>) {
        let output = match joined {
            Ok(output) => output,
            Err(err) => {
                if !err.is_cancelled() {
                    warn!(error = %err, "store task failed");
                }
                self.refresh_status();
                return;
            }
        };
        if !self.is_alive() {
            return;
        }

        match output {
            TaskOutput::Mutation(mutation, result) => {
                let outcome = self.view_model.resolve(mutation, result);
                self.publish();
                if let Some(reply) = self.replies.remove(&mutation) {
                    reply.send(outcome);
                }
            }
            TaskOutput::Loaded { epoch, result, reply } => {
                let outcome = match result {
                    Ok(records) => {
                        self.view_model.finish_reload(epoch, records);
                        self.set_load_error(None);
                        self.publish();
                        Ok(self.view_model.len())
                    }
                    Err(err) => {
                        self.view_model.abandon_reload(epoch);
                        warn!(owner = %self.owner.id, error = %err, "bookmark reload failed");
                        let err = BookmarkError::from(err);
                        self.set_load_error(Some(err.clone()));
                        Err(err)
                    }
                };
                let _ = reply.send(outcome);
            }
        }
        self.refresh_status();
    }

    fn handle_event(&mut self, event: ChangeEvent) {
        if !self.is_alive() {
            return;
        }
        debug!(kind = event.kind_name(), id = %event.record_id(), "remote change received");
        match self.view_model.apply_remote_event(event) {
            RemoteOutcome::Ignored => {}
            RemoteOutcome::Applied | RemoteOutcome::Adopted(_) => {
                self.publish();
                self.sync_deadline = Some(Instant::now() + self.sync_indicator);
                self.refresh_status();
            }
        }
    }

    fn set_load_error(&self, err: Option<BookmarkError>) {
        if let Ok(mut guard) = self.load_error.lock() {
            *guard = err;
        }
    }

    fn publish(&self) {
        let current = self.view_model.bookmarks();
        self.collection_tx.send_if_modified(|published| {
            if published.as_slice() == current {
                false
            } else {
                *published = current.to_vec();
                true
            }
        });
    }

    fn refresh_status(&self) {
        let next = if self.in_flight.is_empty() && self.sync_deadline.is_none() {
            SyncStatus::Synced
        } else {
            SyncStatus::Syncing
        };
        self.status_tx.send_if_modified(|status| {
            let changed = *status != next;
            *status = next;
            changed
        });
    }

    fn shut_down(&mut self) {
        self.view_model.dispose();
        self.in_flight.abort_all();
        let abandoned = self.replies.len();
        // Dropping the senders makes waiting callers see `Disposed`.
        self.replies.clear();
        debug!(owner = %self.owner.id, abandoned, "session loop stopped");
    }
}
