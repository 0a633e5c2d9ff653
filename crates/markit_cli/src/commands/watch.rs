//! Watch command implementation.

use super::print_text;
use markit_core::SearchView;
use markit_sync::{RemoteGateway, SyncController};

/// Runs the watch command until Ctrl-C or the session ends.
pub async fn run<G: RemoteGateway>(
    controller: &SyncController<G>,
    query: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = SearchView::new(query.unwrap_or_default());
    let mut changes = controller.watch();
    let mut last_shown = None;

    println!("Watching bookmarks (Ctrl-C to stop)");
    loop {
        let rows = view.apply_owned(&controller.snapshot());
        if last_shown.as_ref() != Some(&rows) {
            println!();
            print_text(&rows);
            last_shown = Some(rows);
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let stats = controller.stats();
    println!();
    println!(
        "{} change(s) applied, {} resubscribe(s)",
        stats.events_applied, stats.resubscribes
    );
    Ok(())
}
