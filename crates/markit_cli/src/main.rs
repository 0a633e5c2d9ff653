//! MarkIt CLI
//!
//! Command-line front end for MarkIt bookmark sync.
//!
//! # Commands
//!
//! - `list` - Print the bookmark list, optionally filtered
//! - `add` - Create a bookmark and wait for the service to confirm it
//! - `remove` - Delete a bookmark and wait for the service to confirm it
//! - `watch` - Print the filtered list whenever it changes
//! - `shell` - Interactive session over one live controller

mod commands;

use clap::{Parser, Subcommand};
use markit_core::OwnerId;
use markit_sync::{
    ConfigError, MemoryGateway, RemoteGateway, RestGateway, ServiceConfig, SyncConfig,
    SyncController, SERVICE_KEY_ENV, SERVICE_URL_ENV,
};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Owner used by `--offline` sessions when none is given.
const OFFLINE_OWNER: &str = "local";

/// MarkIt bookmark sync from the command line.
#[derive(Parser)]
#[command(name = "markit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the data service
    #[arg(global = true, long, env = SERVICE_URL_ENV)]
    service_url: Option<String>,

    /// Public API key of the data service
    #[arg(global = true, long, env = SERVICE_KEY_ENV, hide_env_values = true)]
    service_key: Option<String>,

    /// Access token of the signed-in user
    #[arg(global = true, long, env = "MARKIT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Identity whose bookmarks are synced
    #[arg(global = true, long, env = "MARKIT_OWNER")]
    owner: Option<String>,

    /// Use the in-process reference service instead of the network
    #[arg(global = true, long)]
    offline: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bookmark list, newest first
    List {
        /// Only show bookmarks whose title or url contains this text
        #[arg(short, long)]
        query: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a bookmark
    Add {
        /// Bookmark title
        title: String,

        /// Bookmark url; `https://` is assumed when no scheme is given
        url: String,
    },

    /// Remove a bookmark by id
    Remove {
        /// Bookmark id
        id: String,
    },

    /// Print the list whenever it changes, until Ctrl-C
    Watch {
        /// Only show bookmarks whose title or url contains this text
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Interactive shell
    Shell,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("MarkIt CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("MarkIt Core v{}", markit_core::VERSION);
        return Ok(());
    }

    if cli.offline {
        let owner = OwnerId::new(cli.owner.as_deref().unwrap_or(OFFLINE_OWNER));
        debug!(owner = %owner, "using in-process service");
        return run(Arc::new(MemoryGateway::new()), owner, cli.command).await;
    }

    let owner = cli
        .owner
        .map(OwnerId::new)
        .ok_or("Owner required (--owner or MARKIT_OWNER)")?;
    let config = ServiceConfig::new(
        cli.service_url.ok_or(ConfigError::MissingUrl)?,
        cli.service_key.ok_or(ConfigError::MissingKey)?,
    )?;
    let mut gateway = RestGateway::new(config)?;
    if let Some(token) = cli.access_token {
        gateway = gateway.with_access_token(token);
    }

    run(Arc::new(gateway), owner, cli.command).await
}

async fn run<G: RemoteGateway>(
    gateway: Arc<G>,
    owner: OwnerId,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = SyncController::new(gateway, SyncConfig::default());
    controller.start(owner).await?;

    let result = match command {
        Commands::List { query, format } => {
            commands::list::run(&controller, query.as_deref(), &format)
        }
        Commands::Add { title, url } => commands::add::run(&controller, &title, &url).await,
        Commands::Remove { id } => commands::remove::run(&controller, &id).await,
        Commands::Watch { query } => commands::watch::run(&controller, query.as_deref()).await,
        Commands::Shell => commands::shell::run(&controller).await,
        Commands::Version => Ok(()),
    };

    controller.stop().await;
    result
}
