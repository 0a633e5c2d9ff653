//! Integration tests for the sync controller against a scripted service.

use async_trait::async_trait;
use markit_core::{Bookmark, BookmarkId, ChangeEvent, NewBookmark, OwnerId};
use markit_sync::{
    MemoryGateway, RemoteGateway, ServiceResult, Subscription, SyncConfig, SyncController,
    SyncState,
};
use markit_testkit::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// A gateway whose change feed is driven by the test.
///
/// Writes are only recorded; the test decides which events the service
/// announces, and when.
#[derive(Default)]
struct ScriptedGateway {
    rows: Mutex<Vec<Bookmark>>,
    created: Mutex<Vec<NewBookmark>>,
    removed: Mutex<Vec<BookmarkId>>,
    feed: Mutex<Option<UnboundedSender<ChangeEvent>>>,
}

impl ScriptedGateway {
    fn with_rows(rows: Vec<Bookmark>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    fn announce(&self, event: ChangeEvent) {
        if let Some(tx) = self.feed.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    fn feed_closed(&self) -> bool {
        self.feed.lock().as_ref().map_or(true, |tx| tx.is_closed())
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn fetch_all(&self, _owner: &OwnerId) -> ServiceResult<Vec<Bookmark>> {
        Ok(self.rows.lock().clone())
    }

    async fn create(&self, draft: &NewBookmark) -> ServiceResult<()> {
        self.created.lock().push(draft.clone());
        Ok(())
    }

    async fn remove(&self, id: &BookmarkId) -> ServiceResult<()> {
        self.removed.lock().push(id.clone());
        Ok(())
    }

    async fn subscribe(&self, owner: &OwnerId) -> ServiceResult<Subscription> {
        let (tx, subscription) = Subscription::channel(owner.clone());
        *self.feed.lock() = Some(tx);
        Ok(subscription)
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn wait_for<G: RemoteGateway>(
    controller: &SyncController<G>,
    done: impl Fn(&[Bookmark]) -> bool,
) {
    let mut rx = controller.watch();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(&controller.snapshot()) {
            rx.changed().await.expect("controller dropped");
        }
    })
    .await
    .expect("timed out waiting for store");
}

fn ids<G: RemoteGateway>(controller: &SyncController<G>) -> Vec<String> {
    controller
        .snapshot()
        .into_iter()
        .map(|b| b.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_add_applies_only_on_created_event() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    assert_eq!(controller.start(owner()).await.unwrap(), 0);

    controller.add_bookmark("Example", "example.com").await.unwrap();
    {
        let created = gateway.created.lock();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].url, "https://example.com");
        assert_eq!(created[0].owner, owner());
    }

    settle().await;
    assert!(controller.snapshot().is_empty());

    let row = BookmarkBuilder::new("b1")
        .title("Example")
        .url("https://example.com")
        .created(1)
        .build();
    gateway.announce(ChangeEvent::Created(row.clone()));
    wait_for(&controller, |rows| !rows.is_empty()).await;

    assert_eq!(controller.snapshot(), vec![row]);
}

#[tokio::test]
async fn test_qualified_url_is_sent_unchanged() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    controller.start(owner()).await.unwrap();

    controller
        .add_bookmark("Docs", "http://docs.example.org/path")
        .await
        .unwrap();
    controller.add_bookmark("Mail", "mailto:me@example.org").await.unwrap();

    let created = gateway.created.lock();
    assert_eq!(created[0].url, "http://docs.example.org/path");
    assert_eq!(created[1].url, "mailto:me@example.org");
}

#[tokio::test]
async fn test_delete_applies_only_on_deleted_event() {
    let gateway = Arc::new(ScriptedGateway::with_rows(vec![
        bookmark("b1", 1),
        bookmark("b2", 2),
    ]));
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    assert_eq!(controller.start(owner()).await.unwrap(), 2);
    assert_eq!(ids(&controller), vec!["b2", "b1"]);

    controller.delete_bookmark(&BookmarkId::new("b1")).await.unwrap();
    assert_eq!(gateway.removed.lock().as_slice(), &[BookmarkId::new("b1")]);
    settle().await;
    assert_eq!(controller.snapshot().len(), 2);

    gateway.announce(ChangeEvent::deleted("b1"));
    wait_for(&controller, |rows| rows.len() == 1).await;
    assert_eq!(ids(&controller), vec!["b2"]);

    // a second delete of the same id changes nothing
    gateway.announce(ChangeEvent::deleted("b1"));
    settle().await;
    assert_eq!(ids(&controller), vec!["b2"]);
}

#[tokio::test]
async fn test_events_keep_newest_first_order() {
    let gateway = Arc::new(ScriptedGateway::with_rows(vec![bookmark("mid", 50)]));
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    controller.start(owner()).await.unwrap();

    gateway.announce(ChangeEvent::Created(bookmark("old", 10)));
    gateway.announce(ChangeEvent::Created(bookmark("new", 90)));
    wait_for(&controller, |rows| rows.len() == 3).await;

    assert_eq!(ids(&controller), vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_search_after_events() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    controller.start(owner()).await.unwrap();

    gateway.announce(ChangeEvent::Created(
        BookmarkBuilder::new("go")
            .title("Go Docs")
            .url("https://go.dev")
            .created(1)
            .build(),
    ));
    gateway.announce(ChangeEvent::Created(
        BookmarkBuilder::new("rust")
            .title("Rust Book")
            .url("https://doc.rust-lang.org/book")
            .created(2)
            .build(),
    ));
    wait_for(&controller, |rows| rows.len() == 2).await;

    let hits = controller.search("GO");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Go Docs");
    assert_eq!(controller.search("rust-lang").len(), 1);
    assert!(controller.search("python").is_empty());
    assert_eq!(controller.search("   ").len(), 2);
}

#[tokio::test]
async fn test_stop_ignores_late_events() {
    let gateway = Arc::new(ScriptedGateway::with_rows(vec![bookmark("b1", 1)]));
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    controller.start(owner()).await.unwrap();
    assert!(!gateway.feed_closed());

    controller.stop().await;
    assert!(gateway.feed_closed());

    gateway.announce(ChangeEvent::Created(bookmark("late", 9)));
    settle().await;
    assert!(controller.snapshot().is_empty());
    assert_eq!(controller.state(), SyncState::Uninitialized);
}

#[tokio::test]
async fn test_dropping_controller_closes_feed() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut controller = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    controller.start(owner()).await.unwrap();

    drop(controller);
    settle().await;
    assert!(gateway.feed_closed());
}

#[tokio::test]
async fn test_memory_gateway_end_to_end() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed(bookmark("seeded", 1));
    gateway.seed(BookmarkBuilder::new("theirs").owner(other_owner()).build());

    let mut mine = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    let mut theirs = SyncController::new(Arc::clone(&gateway), SyncConfig::new());
    mine.start(owner()).await.unwrap();
    theirs.start(other_owner()).await.unwrap();

    mine.add_bookmark("Example", "example.com").await.unwrap();
    wait_for(&mine, |rows| rows.len() == 2).await;
    settle().await;

    // each controller only sees its own owner's rows
    assert_eq!(ids(&theirs), vec!["theirs"]);
    let added = mine.snapshot()[0].clone();
    assert_eq!(added.url, "https://example.com");

    mine.delete_bookmark(&added.id).await.unwrap();
    wait_for(&mine, |rows| rows.len() == 1).await;
    assert_eq!(ids(&mine), vec!["seeded"]);
    assert_eq!(gateway.rows(&owner()).len(), 1);
}
