//! Anime playlist CLI.
//!
//! Lists and edits the playlist stored on this device, using the same
//! storage layer the front-end does.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use playlist_store::{CompositeStore, PlaylistManager};
use shared::{Config, DataPaths, LogConfig, PlaylistItem};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "anime-playlist", author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the playlist, oldest entry first
    List {
        /// Print the stored records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an anime record read from a JSON file ("-" for stdin)
    Add { source: PathBuf },
    /// Remove an anime by MAL ID
    Remove { mal_id: u32 },
    /// Check whether an anime is in the playlist
    Check { mal_id: u32 },
    /// Remove every entry
    Clear,
    /// Show which storage backends are in use
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_config(&config, "anime-playlist");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    let paths = DataPaths::from_config(&config);
    paths
        .create_dirs()
        .context("Failed to create data directories")?;
    info!(
        data_dir = %paths.root().display(),
        logs_dir = %paths.logs_dir().display(),
        "Using data directories"
    );

    let store = Arc::new(CompositeStore::from_config(&config));
    let playlist = PlaylistManager::with_max_items(store, config.playlist.max_items);

    match args.command {
        Command::List { json } => {
            let items = playlist.get_playlist().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("Playlist is empty");
            } else {
                for item in &items {
                    println!("{}", describe(item));
                }
                println!("{}/{} entries", items.len(), playlist.max_items());
            }
        }
        Command::Add { source } => {
            let item = read_record(&source)?;
            let line = describe(&item);
            if playlist.add_to_playlist(item).await {
                println!("Added: {}", line);
            } else {
                println!("Not added (already in playlist or storage unavailable): {}", line);
            }
        }
        Command::Remove { mal_id } => {
            if playlist.remove_from_playlist(mal_id).await {
                println!("Removed {} (if present)", mal_id);
            } else {
                println!("Could not update playlist storage");
            }
        }
        Command::Check { mal_id } => {
            let present = playlist.is_in_playlist(mal_id).await;
            println!("{} is {}in the playlist", mal_id, if present { "" } else { "not " });
        }
        Command::Clear => {
            if playlist.clear_playlist().await {
                println!("Playlist cleared");
            } else {
                println!("Could not clear playlist storage");
            }
        }
        Command::Info => {
            let info = playlist.get_storage_info().await;
            let active = info
                .active
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "none".to_string());
            let supported: Vec<&str> = info.supported.iter().map(|kind| kind.as_str()).collect();
            println!("Active backend: {}", active);
            println!("Usable backends: {}", supported.join(", "));
        }
    }

    Ok(())
}

/// Read one anime record from a file, or from stdin for "-"
fn read_record(source: &Path) -> Result<PlaylistItem> {
    let content = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read anime record from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read anime record: {}", source.display()))?
    };

    PlaylistItem::from_json_str(&content)
}

/// One-line summary of a playlist entry
fn describe(item: &PlaylistItem) -> String {
    let mut details = Vec::new();
    if let Some(anime_type) = &item.anime_type {
        details.push(anime_type.clone());
    }
    if let Some(episodes) = item.episodes {
        details.push(format!("{} eps", episodes));
    }
    if let Some(score) = item.score {
        details.push(format!("score {:.2}", score));
    }
    if let Some(year) = item.year {
        details.push(year.to_string());
    }

    if details.is_empty() {
        format!("{:>6}  {}", item.mal_id, item.title)
    } else {
        format!("{:>6}  {} [{}]", item.mal_id, item.title, details.join(", "))
    }
}
