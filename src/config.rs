//! Command-line configuration

use crate::storage::{PlayerId, Storage, StorageError, DB_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Longest handle kept, in characters
pub const MAX_HANDLE_LEN: usize = 12;

const LOG_FILE: &str = "otiyot.log";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "otiyot")]
#[command(about = "Two-player Hebrew word game on a 10x10 board", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Player handle (defaults to the last one used, then $USER)
    #[arg(short, long)]
    pub player: Option<String>,

    /// SQLite database file shared by both players
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Newline-delimited word list (defaults to the built-in list)
    #[arg(short, long)]
    pub dictionary: Option<PathBuf>,

    /// Seed for letter draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log file (defaults to otiyot.log in the data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn db_path(&self) -> Result<PathBuf, StorageError> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => Ok(Storage::data_dir()?.join(DB_FILE)),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf, StorageError> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Storage::data_dir()?.join(LOG_FILE)),
        }
    }

    /// Pick the player's identity: the flag, then the stored handle, then
    /// `$USER`, then "player".
    pub fn resolve_player(&self, stored: Option<String>) -> PlayerId {
        let handle = [self.player.clone(), stored, std::env::var("USER").ok()]
            .into_iter()
            .flatten()
            .map(|h| clean_handle(&h))
            .find(|h| !h.is_empty())
            .unwrap_or_else(|| "player".to_string());
        PlayerId::new(handle)
    }
}

fn clean_handle(raw: &str) -> String {
    raw.trim().chars().take(MAX_HANDLE_LEN).collect()
}
