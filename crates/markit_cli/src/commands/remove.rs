//! Remove command implementation.

use super::{wait_for, CONFIRM_TIMEOUT};
use markit_core::BookmarkId;
use markit_sync::{RemoteGateway, SyncController};

/// Runs the remove command.
pub async fn run<G: RemoteGateway>(
    controller: &SyncController<G>,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = BookmarkId::new(id);
    let present = controller.with_store(|store| store.is_some_and(|s| s.contains(&id)));
    if !present {
        println!("No bookmark {id}");
        return Ok(());
    }

    controller.delete_bookmark(&id).await?;

    let gone = wait_for(controller, CONFIRM_TIMEOUT, |rows| {
        rows.iter().all(|b| b.id != id)
    })
    .await;
    if gone {
        println!("Removed {id}");
    } else {
        println!("Delete of {id} sent; not yet confirmed by the service");
    }

    Ok(())
}
