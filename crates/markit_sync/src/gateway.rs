//! Remote gateway abstraction.

use crate::error::ServiceResult;
use async_trait::async_trait;
use markit_core::{Bookmark, BookmarkId, ChangeEvent, NewBookmark, OwnerId};
use tokio::sync::mpsc;

/// The data-service boundary: list, create, delete and subscribe.
///
/// This trait abstracts the hosted backend, allowing for different
/// implementations (REST, in-process reference service, test doubles).
///
/// Writes are fire-and-forget: `create` and `remove` report only success or
/// failure. The stored row, including its id and timestamp, is announced
/// through the change subscription, and that announcement may arrive before
/// or after the write call returns.
#[async_trait]
pub trait RemoteGateway: Send + Sync + 'static {
    /// Fetches every bookmark of `owner`, newest first.
    async fn fetch_all(&self, owner: &OwnerId) -> ServiceResult<Vec<Bookmark>>;

    /// Creates a bookmark.
    async fn create(&self, draft: &NewBookmark) -> ServiceResult<()>;

    /// Deletes a bookmark by id.
    async fn remove(&self, id: &BookmarkId) -> ServiceResult<()>;

    /// Opens a change subscription scoped to `owner`.
    async fn subscribe(&self, owner: &OwnerId) -> ServiceResult<Subscription>;
}

/// A live change subscription.
///
/// Events are delivered through a channel. The stream ends when the remote
/// side drops the subscription (disconnect); dropping or closing the
/// `Subscription` cancels it from this side.
#[derive(Debug)]
pub struct Subscription {
    owner: OwnerId,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    /// Wraps the receiving half of a change channel.
    pub fn new(owner: OwnerId, events: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { owner, events }
    }

    /// Creates a subscription and the sender that feeds it.
    pub fn channel(owner: OwnerId) -> (mpsc::UnboundedSender<ChangeEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(owner, rx))
    }

    /// Returns the owner this subscription is scoped to.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Waits for the next event. Returns `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Returns an already delivered event without waiting.
    pub fn try_next_event(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Closes the subscription; no further events are accepted.
    pub fn close(&mut self) {
        self.events.close();
    }
}
