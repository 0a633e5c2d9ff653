//! Interactive shell implementation.
//!
//! One controller stays live for the whole shell, so changes made elsewhere
//! show up in `ls` as soon as the service announces them.

use super::{format_row, print_text};
use markit_core::{BookmarkId, SearchView};
use markit_sync::{RemoteGateway, SyncController};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  add <title...> <url>   create a bookmark (url is the last word)
  rm <id>                delete a bookmark
  ls                     list bookmarks matching the current filter
  find [query]           set the filter; no query clears it
  status                 show sync state and counters
  help                   show this help
  quit                   leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Create a bookmark.
    Add {
        /// Title, possibly several words.
        title: String,
        /// Raw url as typed.
        url: String,
    },
    /// Delete a bookmark.
    Remove(String),
    /// List the filtered view.
    List,
    /// Replace the filter.
    Find(String),
    /// Print state and stats.
    Status,
    /// Print usage.
    Help,
    /// Leave the shell.
    Quit,
    /// Blank line.
    Empty,
}

/// Parses one input line.
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Ok(ShellCommand::Empty),
        "add" => {
            let Some((title, url)) = rest.rsplit_once(char::is_whitespace) else {
                return Err("usage: add <title...> <url>".into());
            };
            Ok(ShellCommand::Add {
                title: title.trim().to_string(),
                url: url.to_string(),
            })
        }
        "rm" | "remove" => match rest {
            "" => Err("usage: rm <id>".into()),
            id => Ok(ShellCommand::Remove(id.to_string())),
        },
        "ls" | "list" => Ok(ShellCommand::List),
        "find" => Ok(ShellCommand::Find(rest.to_string())),
        "status" => Ok(ShellCommand::Status),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

/// Runs the interactive shell until `quit` or end of input.
pub async fn run<G: RemoteGateway>(
    controller: &SyncController<G>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = SearchView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "MarkIt shell for {} ({} bookmarks). Type 'help' for commands.",
        controller
            .owner()
            .map(|o| o.to_string())
            .unwrap_or_default(),
        controller.snapshot().len()
    );

    loop {
        print!("markit> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Add { title, url } => match controller.add_bookmark(&title, &url).await {
                Ok(draft) => println!("sent {} <{}>", draft.title, draft.url),
                Err(e) => println!("error: {e}"),
            },
            ShellCommand::Remove(id) => {
                match controller.delete_bookmark(&BookmarkId::new(id)).await {
                    Ok(()) => println!("delete sent"),
                    Err(e) => println!("error: {e}"),
                }
            }
            ShellCommand::List => {
                let rows = view.apply_owned(&controller.snapshot());
                print_text(&rows);
            }
            ShellCommand::Find(query) => {
                view.set_query(query);
                let rows = view.apply_owned(&controller.snapshot());
                for row in &rows {
                    println!("{}", format_row(row));
                }
                println!("{} match(es)", rows.len());
            }
            ShellCommand::Status => {
                let stats = controller.stats();
                println!("state:        {}", controller.state());
                println!("live:         {}", controller.is_live());
                println!("bookmarks:    {}", controller.snapshot().len());
                println!("filter:       {:?}", view.query());
                println!("applied:      {}", stats.events_applied);
                println!("ignored:      {}", stats.events_ignored);
                println!("sent:         {}", stats.mutations_sent);
                println!("failed:       {}", stats.mutations_failed);
                println!("resubscribes: {}", stats.resubscribes);
                if let Some(error) = &stats.last_error {
                    println!("last error:   {error}");
                }
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
    }

    Ok(())
}
