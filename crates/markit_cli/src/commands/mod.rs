//! CLI command implementations.

pub mod add;
pub mod list;
pub mod remove;
pub mod shell;
pub mod watch;

use markit_core::Bookmark;
use markit_sync::{RemoteGateway, SyncController};
use std::time::Duration;

/// How long `add` and `remove` wait for the service to confirm a write.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(15);

/// Waits until `done` holds for the controller's list.
///
/// Returns false if the timeout elapses first.
pub async fn wait_for<G: RemoteGateway>(
    controller: &SyncController<G>,
    timeout: Duration,
    done: impl Fn(&[Bookmark]) -> bool,
) -> bool {
    let mut changes = controller.watch();
    let waited = tokio::time::timeout(timeout, async {
        while !done(&controller.snapshot()) {
            if changes.changed().await.is_err() {
                return false;
            }
        }
        true
    })
    .await;
    waited.unwrap_or(false)
}

/// Prints bookmarks as aligned text lines.
pub fn print_text(rows: &[Bookmark]) {
    if rows.is_empty() {
        println!("(no bookmarks)");
        return;
    }
    for row in rows {
        println!("{}", format_row(row));
    }
}

/// Formats one bookmark as a text line.
pub fn format_row(row: &Bookmark) -> String {
    format!(
        "{:<36}  {}  {}  <{}>",
        row.id,
        row.created_at.format("%Y-%m-%d %H:%M"),
        row.title,
        row.url
    )
}
