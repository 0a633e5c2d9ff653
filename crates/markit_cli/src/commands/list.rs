//! List command implementation.

use super::print_text;
use markit_core::Bookmark;
use markit_sync::{RemoteGateway, SyncController};
use serde::Serialize;

/// Listing result.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Owner whose bookmarks were listed.
    pub owner: String,
    /// Filter that was applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Number of bookmarks shown.
    pub count: usize,
    /// The bookmarks, newest first.
    pub bookmarks: Vec<Bookmark>,
}

/// Runs the list command.
pub fn run<G: RemoteGateway>(
    controller: &SyncController<G>,
    query: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bookmarks = match query {
        Some(query) => controller.search(query),
        None => controller.snapshot(),
    };

    let result = ListResult {
        owner: controller
            .owner()
            .map(|o| o.to_string())
            .unwrap_or_default(),
        query: query.map(str::to_string),
        count: bookmarks.len(),
        bookmarks,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text(&result.bookmarks);
            println!();
            println!("{} bookmark(s) for {}", result.count, result.owner);
        }
    }

    Ok(())
}
