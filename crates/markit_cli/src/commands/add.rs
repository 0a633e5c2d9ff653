//! Add command implementation.

use super::{format_row, wait_for, CONFIRM_TIMEOUT};
use markit_sync::{RemoteGateway, SyncController};
use std::collections::HashSet;

/// Runs the add command.
///
/// The bookmark is printed once the service announces it; the local list is
/// never updated ahead of that confirmation.
pub async fn run<G: RemoteGateway>(
    controller: &SyncController<G>,
    title: &str,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let known: HashSet<_> = controller.snapshot().into_iter().map(|b| b.id).collect();
    let draft = controller.add_bookmark(title, url).await?;

    let is_new = |b: &markit_core::Bookmark| {
        !known.contains(&b.id) && b.title == draft.title && b.url == draft.url
    };
    let confirmed = wait_for(controller, CONFIRM_TIMEOUT, |rows| rows.iter().any(is_new)).await;

    match controller.snapshot().iter().find(|b| is_new(b)) {
        Some(row) if confirmed => println!("Added {}", format_row(row)),
        _ => println!(
            "Sent {} <{}>; not yet confirmed by the service",
            draft.title, draft.url
        ),
    }

    Ok(())
}
