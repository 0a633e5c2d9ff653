//! Bookmark sync controller.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::state::{SyncState, SyncStats};
use crate::worker::{Shared, Worker};
use markit_core::{filter, Bookmark, BookmarkId, BookmarkStore, NewBookmark, OwnerId};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ActiveSession {
    owner: OwnerId,
    worker: JoinHandle<()>,
}

/// Puts the controller in `Error` if `start` is dropped before it finishes.
struct LoadGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.discard();
            self.shared.set_state(SyncState::Error);
        }
    }
}

/// Keeps an in-memory bookmark list consistent with a remote service.
///
/// The controller:
/// - Loads the owner's bookmarks, then follows the change subscription
/// - Sends creates and deletes to the service without touching the store
/// - Updates the store only from confirmed change events
/// - Recovers a dropped change stream by resubscribing and re-fetching
///
/// ```text
/// uninitialized ──start──▶ loading ──ok──▶ ready
///       ▲                     │              │
///       │                    err             │
///       │                     ▼              │
///       └────────stop──────  error ◀─────────┘ (stop from any state)
/// ```
pub struct SyncController<G: RemoteGateway> {
    gateway: Arc<G>,
    config: SyncConfig,
    shared: Arc<Shared>,
    session: Option<ActiveSession>,
}

impl<G: RemoteGateway> SyncController<G> {
    /// Creates a controller over `gateway`.
    pub fn new(gateway: Arc<G>, config: SyncConfig) -> Self {
        Self {
            gateway,
            config,
            shared: Arc::new(Shared::new()),
            session: None,
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        self.shared.state()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.shared.stats.read().clone()
    }

    /// Returns the gateway.
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Returns the owner of the active session.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.session.as_ref().map(|s| &s.owner)
    }

    /// Returns true while the change subscription is connected.
    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    /// Starts a session for `owner`: loads the list, then subscribes.
    ///
    /// Returns the number of bookmarks loaded. On failure the controller is
    /// left in [`SyncState::Error`] and `start` may be called again. The same
    /// holds when the returned future is dropped before completing.
    pub async fn start(&mut self, owner: OwnerId) -> SyncResult<usize> {
        let state = self.state();
        if !state.can_start() {
            return Err(SyncError::invalid_state(state, "start a session"));
        }

        let epoch = self.shared.next_epoch();
        self.shared.set_state(SyncState::Loading);
        let mut guard = LoadGuard {
            shared: Arc::clone(&self.shared),
            armed: true,
        };
        info!(owner = %owner, "loading bookmarks");

        let rows = match self.gateway.fetch_all(&owner).await {
            Ok(rows) => rows,
            Err(e) => {
                let error = SyncError::FetchFailed(e);
                warn!(owner = %owner, "{error}");
                self.shared.set_state(SyncState::Error);
                self.shared.record_error(&error);
                return Err(error);
            }
        };

        let mut store = BookmarkStore::new(owner.clone());
        let count = store.replace_all(rows);
        self.shared.install(epoch, store);
        self.shared.set_state(SyncState::Ready);
        {
            let mut stats = self.shared.stats.write();
            stats.sessions_started += 1;
            stats.last_load_count = count;
            stats.last_error = None;
        }
        info!(owner = %owner, count, "bookmarks loaded");

        // The store is populated before any event can reach it.
        let initial = match self.gateway.subscribe(&owner).await {
            Ok(subscription) => {
                self.shared.set_live(true);
                Some(subscription)
            }
            Err(e) => {
                let loss = SyncError::SubscriptionLost(e.to_string());
                warn!(owner = %owner, "{loss}; will retry");
                self.shared.record_error(&loss);
                None
            }
        };

        let worker = Worker {
            gateway: Arc::clone(&self.gateway),
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
            owner: owner.clone(),
            epoch,
        };
        let handle = tokio::spawn(worker.run(initial));
        self.session = Some(ActiveSession {
            owner,
            worker: handle,
        });
        guard.armed = false;

        Ok(count)
    }

    /// Ends the session: closes the subscription and discards the store.
    ///
    /// Always safe to call and idempotent. Once this returns, no event from
    /// the closed subscription can change any store.
    pub async fn stop(&mut self) {
        // Discard first: an in-flight event finishes under the lock, any
        // later one sees a stale epoch.
        self.shared.discard();

        if let Some(session) = self.session.take() {
            session.worker.abort();
            if let Err(e) = session.worker.await {
                if e.is_panic() {
                    warn!(owner = %session.owner, "sync worker panicked");
                }
            }
            info!(owner = %session.owner, "session stopped");
        }

        self.shared.set_live(false);
        self.shared.set_state(SyncState::Uninitialized);
    }

    /// Switches to another identity: `stop` followed by `start`.
    pub async fn switch_owner(&mut self, owner: OwnerId) -> SyncResult<usize> {
        self.stop().await;
        self.start(owner).await
    }

    /// Asks the service to create a bookmark.
    ///
    /// The title must be non-empty; the URL is normalized (a missing scheme
    /// becomes `https://`). The store is not touched: the bookmark appears
    /// once its change event arrives. Returns the draft that was sent.
    pub async fn add_bookmark(&self, title: &str, url: &str) -> SyncResult<NewBookmark> {
        let owner = self.ready_owner("add a bookmark")?;
        let draft = NewBookmark::new(owner, title, url)?;

        debug!(owner = %draft.owner, url = %draft.url, "creating bookmark");
        match self.gateway.create(&draft).await {
            Ok(()) => {
                self.shared.stats.write().mutations_sent += 1;
                Ok(draft)
            }
            Err(e) => Err(self.mutation_failed(e)),
        }
    }

    /// Asks the service to delete a bookmark.
    ///
    /// The store is not touched: the bookmark disappears once its change
    /// event arrives.
    pub async fn delete_bookmark(&self, id: &BookmarkId) -> SyncResult<()> {
        self.ready_owner("delete a bookmark")?;

        debug!(id = %id, "deleting bookmark");
        match self.gateway.remove(id).await {
            Ok(()) => {
                self.shared.stats.write().mutations_sent += 1;
                Ok(())
            }
            Err(e) => Err(self.mutation_failed(e)),
        }
    }

    /// Returns the current bookmarks, newest first.
    ///
    /// Empty when no session is active.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.with_store(|store| store.map(BookmarkStore::snapshot).unwrap_or_default())
    }

    /// Returns the bookmarks matching `query`, newest first.
    pub fn search(&self, query: &str) -> Vec<Bookmark> {
        self.with_store(|store| {
            store
                .map(|s| filter(s.as_slice(), query).into_iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Runs `f` with read access to the current store.
    pub fn with_store<R>(&self, f: impl FnOnce(Option<&BookmarkStore>) -> R) -> R {
        let session = self.shared.session.read();
        f(session.as_ref().map(|s| &s.store))
    }

    /// Returns a receiver that changes whenever the visible list changes.
    ///
    /// Views recompute from [`snapshot`](Self::snapshot) on every change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.shared.watch()
    }

    fn ready_owner(&self, operation: &str) -> SyncResult<OwnerId> {
        let state = self.state();
        match (state, self.owner()) {
            (SyncState::Ready, Some(owner)) => Ok(owner.clone()),
            _ => Err(SyncError::invalid_state(state, operation)),
        }
    }

    fn mutation_failed(&self, e: crate::error::ServiceError) -> SyncError {
        let error = SyncError::MutationFailed(e);
        warn!("{error}");
        self.shared.stats.write().mutations_failed += 1;
        self.shared.record_error(&error);
        error
    }
}

impl<G: RemoteGateway> Drop for SyncController<G> {
    fn drop(&mut self) {
        self.shared.discard();
        if let Some(session) = self.session.take() {
            session.worker.abort();
        }
    }
}
