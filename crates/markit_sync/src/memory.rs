//! In-process reference service.
//!
//! `MemoryGateway` behaves like the hosted backend: it assigns ids and
//! timestamps, scopes reads and subscriptions by owner, and announces every
//! insert and delete as a change event. It also exposes controls for
//! failure injection and delivery timing so controller behaviour can be
//! exercised without a network.

use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{RemoteGateway, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use markit_core::{Bookmark, BookmarkId, ChangeEvent, NewBookmark, OwnerId};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    /// `fetch_all`.
    FetchAll,
    /// `create`.
    Create,
    /// `remove`.
    Remove,
    /// `subscribe`.
    Subscribe,
}

struct Subscriber {
    owner: OwnerId,
    tx: UnboundedSender<ChangeEvent>,
}

struct Inner {
    rows: Vec<Bookmark>,
    subscribers: Vec<Subscriber>,
    held: Option<Vec<(OwnerId, ChangeEvent)>>,
    failures: HashMap<GatewayOp, Vec<ServiceError>>,
    calls: HashMap<GatewayOp, u64>,
    offline: bool,
    duplicate_delivery: bool,
    last_created_at: Option<DateTime<Utc>>,
}

impl Inner {
    fn deliver(&mut self, owner: &OwnerId, event: ChangeEvent) {
        if let Some(held) = self.held.as_mut() {
            held.push((owner.clone(), event));
            return;
        }

        let copies = if self.duplicate_delivery { 2 } else { 1 };
        // Send to matching subscribers, dropping disconnected ones
        self.subscribers.retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            if &sub.owner != owner {
                return true;
            }
            (0..copies).all(|_| sub.tx.send(event.clone()).is_ok())
        });
    }

    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created_at = Some(at);
        at
    }
}

/// An in-memory, owner-scoped bookmark service with a change feed.
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    /// Creates an empty service.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: Vec::new(),
                subscribers: Vec::new(),
                held: None,
                failures: HashMap::new(),
                calls: HashMap::new(),
                offline: false,
                duplicate_delivery: false,
                last_created_at: None,
            }),
        }
    }

    /// Stores a row directly, without announcing it.
    ///
    /// Use this to set up data that existed before a session started, or
    /// that a lost change stream never delivered.
    pub fn seed(&self, row: Bookmark) {
        let mut inner = self.inner.lock();
        inner.rows.retain(|r| r.id != row.id);
        inner.rows.push(row);
    }

    /// Removes a row directly, without announcing it.
    pub fn unseed(&self, id: &BookmarkId) {
        self.inner.lock().rows.retain(|r| &r.id != id);
    }

    /// Returns the stored rows of `owner`, newest first.
    pub fn rows(&self, owner: &OwnerId) -> Vec<Bookmark> {
        let inner = self.inner.lock();
        let mut rows: Vec<_> = inner
            .rows
            .iter()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(Bookmark::newest_first);
        rows
    }

    /// Makes the next call of `op` fail with `error`.
    ///
    /// Several queued failures are consumed in order.
    pub fn fail_next(&self, op: GatewayOp, error: ServiceError) {
        self.inner.lock().failures.entry(op).or_default().push(error);
    }

    /// Makes every call fail with [`ServiceError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Buffers change events instead of delivering them.
    pub fn hold_events(&self) {
        let mut inner = self.inner.lock();
        if inner.held.is_none() {
            inner.held = Some(Vec::new());
        }
    }

    /// Delivers buffered events and resumes immediate delivery.
    pub fn release_events(&self) {
        let mut inner = self.inner.lock();
        let held = inner.held.take().unwrap_or_default();
        for (owner, event) in held {
            inner.deliver(&owner, event);
        }
    }

    /// Delivers every event twice while set.
    pub fn set_duplicate_delivery(&self, enabled: bool) {
        self.inner.lock().duplicate_delivery = enabled;
    }

    /// Pushes an arbitrary event to `owner`'s subscribers.
    pub fn inject(&self, owner: &OwnerId, event: ChangeEvent) {
        self.inner.lock().deliver(owner, event);
    }

    /// Drops every live subscription, ending their streams.
    ///
    /// Events buffered by [`hold_events`](Self::hold_events) are discarded,
    /// as a real disconnect would lose them.
    pub fn disconnect_all(&self) {
        let mut inner = self.inner.lock();
        inner.subscribers.clear();
        if let Some(held) = inner.held.as_mut() {
            held.clear();
        }
    }

    /// Returns the number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|sub| !sub.tx.is_closed());
        inner.subscribers.len()
    }

    /// Returns how many times `op` has been called.
    pub fn call_count(&self, op: GatewayOp) -> u64 {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn begin(&self, op: GatewayOp) -> ServiceResult<parking_lot::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock();
        *inner.calls.entry(op).or_insert(0) += 1;

        if inner.offline {
            return Err(ServiceError::Offline);
        }
        if let Some(queue) = inner.failures.get_mut(&op) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        Ok(inner)
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn fetch_all(&self, owner: &OwnerId) -> ServiceResult<Vec<Bookmark>> {
        drop(self.begin(GatewayOp::FetchAll)?);
        Ok(self.rows(owner))
    }

    async fn create(&self, draft: &NewBookmark) -> ServiceResult<()> {
        let mut inner = self.begin(GatewayOp::Create)?;

        let created_at = inner.next_created_at();
        let row = draft
            .clone()
            .into_bookmark(Uuid::new_v4().to_string(), created_at);
        debug!(id = %row.id, owner = %row.owner, "row inserted");

        inner.rows.push(row.clone());
        let owner = row.owner.clone();
        inner.deliver(&owner, ChangeEvent::Created(row));
        Ok(())
    }

    async fn remove(&self, id: &BookmarkId) -> ServiceResult<()> {
        let mut inner = self.begin(GatewayOp::Remove)?;

        let Some(pos) = inner.rows.iter().position(|r| &r.id == id) else {
            // deleting a missing row matches nothing and is not an error
            return Ok(());
        };
        let row = inner.rows.remove(pos);
        debug!(id = %row.id, owner = %row.owner, "row deleted");
        inner.deliver(&row.owner, ChangeEvent::deleted(row.id.clone()));
        Ok(())
    }

    async fn subscribe(&self, owner: &OwnerId) -> ServiceResult<Subscription> {
        let mut inner = self.begin(GatewayOp::Subscribe)?;

        let (tx, subscription) = Subscription::channel(owner.clone());
        inner.subscribers.push(Subscriber {
            owner: owner.clone(),
            tx,
        });
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> OwnerId {
        OwnerId::new("alice")
    }

    fn draft(title: &str, url: &str) -> NewBookmark {
        NewBookmark::new(alice(), title, url).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_announces() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(&alice()).await.unwrap();

        gateway.create(&draft("Example", "example.com")).await.unwrap();

        let Some(ChangeEvent::Created(row)) = sub.next_event().await else {
            panic!("expected created event");
        };
        assert!(!row.id.as_str().is_empty());
        assert_eq!(row.url, "https://example.com");
        assert_eq!(gateway.rows(&alice()), vec![row]);
    }

    #[tokio::test]
    async fn timestamps_strictly_increase() {
        let gateway = MemoryGateway::new();
        for i in 0..5 {
            gateway.create(&draft(&format!("t{i}"), "x.com")).await.unwrap();
        }
        let rows = gateway.rows(&alice());
        for pair in rows.windows(2) {
            assert!(pair[0].created_at > pair[1].created_at);
        }
        assert_eq!(rows[0].title, "t4");
    }

    #[tokio::test]
    async fn events_are_owner_scoped() {
        let gateway = MemoryGateway::new();
        let mut alice_sub = gateway.subscribe(&alice()).await.unwrap();
        let mut bob_sub = gateway.subscribe(&OwnerId::new("bob")).await.unwrap();

        gateway.create(&draft("Mine", "mine.com")).await.unwrap();
        gateway.disconnect_all();

        assert!(matches!(alice_sub.next_event().await, Some(ChangeEvent::Created(_))));
        assert_eq!(bob_sub.next_event().await, None);
    }

    #[tokio::test]
    async fn remove_missing_row_is_ok() {
        let gateway = MemoryGateway::new();
        gateway.remove(&BookmarkId::new("nope")).await.unwrap();
        assert_eq!(gateway.call_count(GatewayOp::Remove), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let gateway = MemoryGateway::new();
        gateway.fail_next(GatewayOp::FetchAll, ServiceError::Offline);
        gateway.fail_next(GatewayOp::FetchAll, ServiceError::Unauthorized("expired".into()));

        assert_eq!(gateway.fetch_all(&alice()).await, Err(ServiceError::Offline));
        assert!(matches!(
            gateway.fetch_all(&alice()).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert_eq!(gateway.fetch_all(&alice()).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn held_events_are_released_in_order() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(&alice()).await.unwrap();

        gateway.hold_events();
        gateway.create(&draft("One", "one.com")).await.unwrap();
        gateway.create(&draft("Two", "two.com")).await.unwrap();
        assert!(sub.try_next_event().is_none());

        gateway.release_events();
        let first = sub.next_event().await.unwrap();
        let second = sub.next_event().await.unwrap();
        match (first, second) {
            (ChangeEvent::Created(a), ChangeEvent::Created(b)) => {
                assert_eq!(a.title, "One");
                assert_eq!(b.title, "Two");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_subscribers_are_pruned() {
        let gateway = MemoryGateway::new();
        let sub = gateway.subscribe(&alice()).await.unwrap();
        assert_eq!(gateway.subscriber_count(), 1);

        drop(sub);
        assert_eq!(gateway.subscriber_count(), 0);
    }
}
