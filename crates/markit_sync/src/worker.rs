//! Session state shared with the change-stream worker.
//!
//! Each session owns one worker task that drains the change subscription.
//! It is the single consumer of change events, so store mutations never
//! interleave. Every mutation re-checks the session epoch under the store
//! lock; once the controller has discarded a session, nothing that worker
//! still holds can touch a store again.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::gateway::{RemoteGateway, Subscription};
use crate::state::{SyncState, SyncStats};
use markit_core::{Bookmark, BookmarkStore, ChangeEvent, OwnerId};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub(crate) struct SessionStore {
    pub(crate) epoch: u64,
    pub(crate) store: BookmarkStore,
}

/// Outcome of offering a change to the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    Changed,
    Unchanged,
    Stale,
}

pub(crate) struct Shared {
    pub(crate) state: RwLock<SyncState>,
    pub(crate) session: RwLock<Option<SessionStore>>,
    pub(crate) stats: RwLock<SyncStats>,
    epoch: AtomicU64,
    live: AtomicBool,
    revision: watch::Sender<u64>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(SyncState::Uninitialized),
            session: RwLock::new(None),
            stats: RwLock::new(SyncStats::default()),
            epoch: AtomicU64::new(0),
            live: AtomicBool::new(false),
            revision,
        }
    }

    pub(crate) fn state(&self) -> SyncState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    pub(crate) fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub(crate) fn record_error(&self, error: &SyncError) {
        self.stats.write().last_error = Some(error.to_string());
    }

    /// Installs a freshly loaded store as the current session.
    pub(crate) fn install(&self, epoch: u64, store: BookmarkStore) {
        *self.session.write() = Some(SessionStore { epoch, store });
        self.bump_revision();
    }

    /// Discards the current session's store.
    pub(crate) fn discard(&self) {
        let had_session = self.session.write().take().is_some();
        self.set_live(false);
        if had_session {
            self.bump_revision();
        }
    }

    /// Applies a change event if `epoch` is still the current session.
    pub(crate) fn apply_event(&self, epoch: u64, event: ChangeEvent) -> Applied {
        let applied = {
            let mut session = self.session.write();
            match session.as_mut() {
                Some(current) if current.epoch == epoch => {
                    if current.store.apply(event) {
                        Applied::Changed
                    } else {
                        Applied::Unchanged
                    }
                }
                _ => Applied::Stale,
            }
        };

        match applied {
            Applied::Changed => {
                let mut stats = self.stats.write();
                stats.events_applied += 1;
                stats.last_event_time = Some(Instant::now());
                drop(stats);
                self.bump_revision();
            }
            Applied::Unchanged => self.stats.write().events_ignored += 1,
            Applied::Stale => {}
        }
        applied
    }

    /// Replaces the store contents if `epoch` is still the current session.
    pub(crate) fn replace_rows(&self, epoch: u64, rows: Vec<Bookmark>) -> Applied {
        let count = {
            let mut session = self.session.write();
            match session.as_mut() {
                Some(current) if current.epoch == epoch => current.store.replace_all(rows),
                _ => return Applied::Stale,
            }
        };

        self.stats.write().last_load_count = count;
        self.bump_revision();
        Applied::Changed
    }
}

/// Why a subscription stopped being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drained {
    StreamEnded,
    SessionDiscarded,
}

/// Drains one session's change subscription.
pub(crate) struct Worker<G: RemoteGateway> {
    pub(crate) gateway: Arc<G>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) config: SyncConfig,
    pub(crate) owner: OwnerId,
    pub(crate) epoch: u64,
}

impl<G: RemoteGateway> Worker<G> {
    /// Runs until the session is discarded or resubscription gives up.
    pub(crate) async fn run(self, initial: Option<Subscription>) {
        // Rows written between the initial load and the subscription only
        // show up in a fetch made after subscribing.
        if initial.is_some()
            && self.config.reconcile_on_resubscribe
            && self.reconcile().await == Applied::Stale
        {
            return;
        }

        let mut next = initial;

        loop {
            let mut subscription = match next.take() {
                Some(subscription) => subscription,
                None => match self.resubscribe().await {
                    Some(subscription) => subscription,
                    None => return,
                },
            };

            self.shared.set_live(true);
            let ended = self.drain(&mut subscription).await;
            self.shared.set_live(false);

            if ended == Drained::SessionDiscarded {
                debug!(owner = %self.owner, "session discarded, worker exiting");
                return;
            }

            let loss = SyncError::SubscriptionLost("change stream ended".into());
            warn!(owner = %self.owner, "{loss}; resubscribing");
            self.shared.stats.write().subscription_losses += 1;
            self.shared.record_error(&loss);
        }
    }

    /// Applies events until the stream ends or the session is gone.
    async fn drain(&self, subscription: &mut Subscription) -> Drained {
        let mut ticker = self.config.reconcile_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                event = subscription.next_event() => {
                    let Some(event) = event else {
                        return Drained::StreamEnded;
                    };
                    debug!(owner = %self.owner, kind = ?event.kind(), id = %event.id(), "change event");
                    if self.shared.apply_event(self.epoch, event) == Applied::Stale {
                        return Drained::SessionDiscarded;
                    }
                }
                _ = next_tick(&mut ticker) => {
                    if self.reconcile().await == Applied::Stale {
                        return Drained::SessionDiscarded;
                    }
                }
            }
        }
    }

    async fn resubscribe(&self) -> Option<Subscription> {
        let retry = &self.config.resubscribe;

        for attempt in 1..=retry.max_attempts {
            tokio::time::sleep(retry.delay_for_attempt(attempt)).await;

            match self.gateway.subscribe(&self.owner).await {
                Ok(subscription) => {
                    info!(owner = %self.owner, attempt, "resubscribed to changes");
                    self.shared.stats.write().resubscribes += 1;
                    if self.config.reconcile_on_resubscribe {
                        self.reconcile().await;
                    }
                    return Some(subscription);
                }
                Err(e) => warn!(owner = %self.owner, attempt, "resubscribe failed: {e}"),
            }
        }

        let loss = SyncError::SubscriptionLost(format!(
            "gave up after {} attempts",
            retry.max_attempts
        ));
        error!(owner = %self.owner, "{loss}");
        self.shared.record_error(&loss);
        None
    }

    /// Re-fetches the full list so events missed by the stream are recovered.
    async fn reconcile(&self) -> Applied {
        match self.gateway.fetch_all(&self.owner).await {
            Ok(rows) => {
                let applied = self.shared.replace_rows(self.epoch, rows);
                if applied != Applied::Stale {
                    debug!(owner = %self.owner, "reconciled with service");
                    self.shared.stats.write().reconciles += 1;
                }
                applied
            }
            Err(e) => {
                warn!(owner = %self.owner, "reconcile failed: {e}");
                self.shared.stats.write().reconcile_failures += 1;
                Applied::Unchanged
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn owner() -> OwnerId {
        OwnerId::new("alice")
    }

    fn row(id: &str) -> Bookmark {
        Bookmark::new(id, owner(), id, format!("https://{id}.example"), Utc::now())
    }

    #[test]
    fn events_apply_to_current_epoch_only() {
        let shared = Shared::new();
        assert_eq!(shared.apply_event(1, ChangeEvent::deleted("b1")), Applied::Stale);

        let first = shared.next_epoch();
        shared.install(first, BookmarkStore::new(owner()));
        assert_eq!(
            shared.apply_event(first, ChangeEvent::Created(row("b1"))),
            Applied::Changed
        );
        assert_eq!(
            shared.apply_event(first, ChangeEvent::Created(row("b1"))),
            Applied::Unchanged
        );

        shared.discard();
        assert_eq!(
            shared.apply_event(first, ChangeEvent::Created(row("b2"))),
            Applied::Stale
        );

        let second = shared.next_epoch();
        shared.install(second, BookmarkStore::new(owner()));
        assert_eq!(
            shared.apply_event(first, ChangeEvent::Created(row("b3"))),
            Applied::Stale
        );
        assert_eq!(shared.replace_rows(first, vec![row("b4")]), Applied::Stale);

        let session = shared.session.read();
        assert!(session.as_ref().unwrap().store.is_empty());
    }

    #[test]
    fn changes_bump_revision() {
        let shared = Shared::new();
        let rx = shared.watch();
        let epoch = shared.next_epoch();

        shared.install(epoch, BookmarkStore::new(owner()));
        assert_eq!(*rx.borrow(), 1);

        shared.apply_event(epoch, ChangeEvent::Created(row("b1")));
        assert_eq!(*rx.borrow(), 2);

        // no-op events leave the revision alone
        shared.apply_event(epoch, ChangeEvent::deleted("missing"));
        assert_eq!(*rx.borrow(), 2);

        shared.discard();
        assert_eq!(*rx.borrow(), 3);

        let stats = shared.stats.read();
        assert_eq!(stats.events_applied, 1);
        assert_eq!(stats.events_ignored, 1);
    }
}
