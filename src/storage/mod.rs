//! Persistent storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - Game records stored as JSON documents with store-assigned update times
//! - Partial-field updates and per-game change notification
//!
//! Several processes may share one database file; each sees the others'
//! commits through [`Storage::changed_since`].

pub mod record;

pub use record::{GameId, GameRecord, GameStatus, GameUpdate, PlayerId, Seat};

use directories::ProjectDirs;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info};

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: meta and games tables
const SCHEMA_VERSION: u32 = 1;

/// Database file name inside the data directory.
pub const DB_FILE: &str = "otiyot.db";

/// Length of a generated game code.
pub const GAME_CODE_LEN: usize = 6;

/// Unambiguous characters for game codes (no 0/O, 1/I).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Could not determine data directory
    #[error("could not determine data directory")]
    NoDataDirectory,
    /// Schema version mismatch (future version)
    #[error("database schema version {found} is newer than supported version {supported}")]
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Failed to create data directory
    #[error("failed to create data directory: {0}")]
    CreateDirFailed(#[source] std::io::Error),
    /// A stored document could not be read or written as JSON
    #[error("malformed game document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("game {0} already has two players")]
    GameFull(GameId),
    /// An update carried an expected version that no longer matches
    #[error("game {id} changed since it was read (expected {expected}, found {found})")]
    StaleRead { id: GameId, expected: i64, found: i64 },
    /// Used by stores that have no connection at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The persistence boundary the game session talks to.
pub trait GameStore {
    /// Read the current record for a game.
    fn load_game(&self, id: &GameId) -> Result<GameRecord, StorageError>;

    /// Apply a partial update and return the stored record, stamped with a
    /// new `updated_at`. When `expected_updated_at` is given and differs from
    /// the stored value the update is refused with [`StorageError::StaleRead`].
    fn update_game(
        &self,
        id: &GameId,
        update: &GameUpdate,
        expected_updated_at: Option<i64>,
    ) -> Result<GameRecord, StorageError>;
}

/// The main storage handle for game data.
pub struct Storage {
    conn: Connection,
    subscribers: RefCell<Vec<(GameId, Sender<GameRecord>)>>,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses OS-standard directories:
    /// - Linux: `$XDG_DATA_HOME/otiyot/` or `~/.local/share/otiyot/`
    /// - macOS: `~/Library/Application Support/otiyot/`
    pub fn open() -> Result<Self, StorageError> {
        let data_dir = Self::data_dir()?;
        Self::open_at(data_dir.join(DB_FILE))
    }

    /// Open or create a database at an explicit path.
    pub fn open_at(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StorageError::CreateDirFailed)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let storage = Self::with_connection(conn)?;
        info!(path = %db_path.display(), "opened game database");
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let storage = Storage {
            conn,
            subscribers: RefCell::new(Vec::new()),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory.
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "otiyot")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    /// Get the last used handle (player name).
    pub fn handle(&self) -> SqlResult<Option<String>> {
        self.conn
            .query_row("SELECT handle FROM meta LIMIT 1", [], |row| row.get::<_, Option<String>>(0))
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(e),
            })
    }

    /// Remember the handle (player name).
    pub fn set_handle(&self, handle: &str) -> SqlResult<()> {
        self.conn.execute("UPDATE meta SET handle = ?1", params![handle])?;
        Ok(())
    }

    /// Create a game with `creator` in the first seat holding `letters`.
    /// The game waits for a second player; the creator moves first.
    pub fn create_game(
        &self,
        creator: &PlayerId,
        letters: Vec<char>,
    ) -> Result<GameRecord, StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        let mut id = generate_game_code(&mut rand::rng());
        while Self::game_exists(&tx, &id)? {
            id = generate_game_code(&mut rand::rng());
        }

        let mut record = GameRecord::new(id, creator.clone(), letters);
        record.updated_at = next_timestamp(0);
        Self::write_record(&tx, &record)?;
        tx.commit()?;

        info!(game = %record.id, player = %creator, "created game");
        Ok(record)
    }

    /// Seat `player` in the second slot with `letters` and start the game.
    ///
    /// Joining a game you already sit in returns it unchanged.
    pub fn join_game(
        &self,
        id: &GameId,
        player: &PlayerId,
        letters: Vec<char>,
    ) -> Result<GameRecord, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = Self::read_record(&tx, id)?;

        if record.seat_of(player).is_some() {
            return Ok(record);
        }
        if record.player2.is_some() {
            return Err(StorageError::GameFull(id.clone()));
        }

        record.player2 = Some(player.clone());
        record.player2_letters = letters;
        if record.status == GameStatus::Waiting {
            record.status = GameStatus::Active;
        }
        record.updated_at = next_timestamp(record.updated_at);
        Self::write_record(&tx, &record)?;
        tx.commit()?;

        info!(game = %id, player = %player, "joined game");
        self.notify(&record);
        Ok(record)
    }

    /// All games a player sits in, most recently updated first.
    pub fn list_games(&self, player: &PlayerId) -> Result<Vec<GameRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT document FROM games WHERE player1 = ?1 OR player2 = ?1 \
             ORDER BY updated_at DESC, id",
        )?;

        let rows = stmt.query_map(params![player.as_str()], |row| row.get::<_, String>(0))?;

        let mut games = Vec::new();
        for row in rows {
            games.push(GameRecord::from_json(&row?)?);
        }
        Ok(games)
    }

    /// The record if it has been updated after `updated_at`, otherwise None.
    /// Used to pick up commits made by another process.
    pub fn changed_since(
        &self,
        id: &GameId,
        updated_at: i64,
    ) -> Result<Option<GameRecord>, StorageError> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM games WHERE id = ?1 AND updated_at > ?2",
                params![id.as_str(), updated_at],
                |row| row.get(0),
            )
            .optional()?;

        Ok(match document {
            Some(json) => Some(GameRecord::from_json(&json)?),
            None => None,
        })
    }

    /// Receive every record this handle writes for `id` from now on.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self, id: &GameId) -> Receiver<GameRecord> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push((id.clone(), tx));
        rx
    }

    // Private helper methods

    fn notify(&self, record: &GameRecord) {
        self.subscribers
            .borrow_mut()
            .retain(|(id, tx)| id != &record.id || tx.send(record.clone()).is_ok());
    }

    fn game_exists(conn: &Connection, id: &GameId) -> Result<bool, StorageError> {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM games WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn read_record(conn: &Connection, id: &GameId) -> Result<GameRecord, StorageError> {
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM games WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let json = document.ok_or_else(|| StorageError::GameNotFound(id.clone()))?;
        Ok(GameRecord::from_json(&json)?)
    }

    fn write_record(conn: &Connection, record: &GameRecord) -> Result<(), StorageError> {
        conn.execute(
            "INSERT OR REPLACE INTO games (id, player1, player2, status, document, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.as_str(),
                record.player1.as_str(),
                record.player2.as_ref().map(PlayerId::as_str),
                record.status.as_str(),
                record.to_json()?,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            // Fresh database, create schema
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            // Database is from a newer version
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        // Check if meta table exists
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: u32 = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(version)
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            -- Meta table: schema version and the last used handle
            CREATE TABLE IF NOT EXISTS meta (
                schema_version INTEGER NOT NULL,
                handle TEXT,
                created_at INTEGER NOT NULL
            );

            -- Games: one JSON document per game, with the fields we
            -- query on copied into columns
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                player1 TEXT NOT NULL,
                player2 TEXT,
                status TEXT NOT NULL,
                document TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_player1 ON games (player1);
            CREATE INDEX IF NOT EXISTS idx_games_player2 ON games (player2);
            "#,
        )?;

        self.conn.execute(
            "INSERT INTO meta (schema_version, handle, created_at) VALUES (?1, NULL, ?2)",
            params![SCHEMA_VERSION, now_millis()],
        )?;

        debug!(version = SCHEMA_VERSION, "created schema");
        Ok(())
    }
}

impl GameStore for Storage {
    fn load_game(&self, id: &GameId) -> Result<GameRecord, StorageError> {
        Self::read_record(&self.conn, id)
    }

    fn update_game(
        &self,
        id: &GameId,
        update: &GameUpdate,
        expected_updated_at: Option<i64>,
    ) -> Result<GameRecord, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut record = Self::read_record(&tx, id)?;

        if let Some(expected) = expected_updated_at {
            if record.updated_at != expected {
                return Err(StorageError::StaleRead {
                    id: id.clone(),
                    expected,
                    found: record.updated_at,
                });
            }
        }

        update.apply_to(&mut record);
        record.updated_at = next_timestamp(record.updated_at);
        Self::write_record(&tx, &record)?;
        tx.commit()?;

        debug!(game = %id, updated_at = record.updated_at, "updated game");
        self.notify(&record);
        Ok(record)
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Wall-clock millis, bumped past `previous` so per-game stamps strictly increase.
fn next_timestamp(previous: i64) -> i64 {
    now_millis().max(previous + 1)
}

fn generate_game_code<R: Rng + ?Sized>(rng: &mut R) -> GameId {
    let code: String = (0..GAME_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    GameId::new(code)
}
