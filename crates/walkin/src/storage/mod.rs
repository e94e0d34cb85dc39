//! Storage layer for walkin.
//!
//! The kiosk persists two independent slots, the active queue and the day's
//! history, each as a JSON array of entries. [`Repository`] is the seam the
//! store talks to; [`Storage`] is the `SQLite`-backed implementation and
//! [`MemoryStorage`] an in-process one for tests and ephemeral sessions.

pub mod migrations;
pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::entry::Entry;
use crate::error::{Error, Result};

/// One of the two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Unresolved entries, oldest first.
    Queue,
    /// Every entry created today.
    History,
}

impl Slot {
    /// The storage key for this slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Queue => "hunter-helpdesk-queue-v1",
            Self::History => "hunter-helpdesk-history-v1",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queue => write!(f, "queue"),
            Self::History => write!(f, "history"),
        }
    }
}

/// Both collections as read from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Active queue.
    pub queue: Vec<Entry>,
    /// Day history.
    pub history: Vec<Entry>,
}

/// Durable key/value storage for the kiosk slots.
pub trait Repository {
    /// Read the raw value of a slot, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn read_slot(&self, slot: Slot) -> Result<Option<String>>;

    /// Overwrite the raw value of a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be written.
    fn write_slot(&mut self, slot: Slot, value: &str) -> Result<()>;

    /// Decode one slot. Missing, unreadable, or corrupt data reads as empty;
    /// malformed elements of an otherwise valid array are skipped.
    fn load_slot(&self, slot: Slot) -> Vec<Entry> {
        match self.read_slot(slot) {
            Ok(Some(raw)) => decode_entries(slot, &raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%slot, error = %e, "Failed to read slot, starting empty");
                Vec::new()
            }
        }
    }

    /// Load both slots, best-effort.
    fn load(&self) -> StoreState {
        StoreState {
            queue: self.load_slot(Slot::Queue),
            history: self.load_slot(Slot::History),
        }
    }

    /// Encode and write one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    fn save_slot(&mut self, slot: Slot, entries: &[Entry]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.write_slot(slot, &raw)
    }
}

fn decode_entries(slot: Slot, raw: &str) -> Vec<Entry> {
    let items: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(%slot, error = %e, "Discarding unreadable slot contents");
            return Vec::new();
        }
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(%slot, index, error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect()
}

/// `SQLite`-backed slot storage.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the database file in bytes, 0 for in-memory databases.
    #[must_use]
    pub fn db_size_bytes(&self) -> u64 {
        if self.path.as_os_str() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        }
    }
}

impl Repository for Storage {
    fn read_slot(&self, slot: Slot) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                [slot.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&mut self, slot: Slot, value: &str) -> Result<()> {
        self.conn
            .execute(schema::UPSERT_SLOT, (slot.key(), value))?;
        debug!(%slot, bytes = value.len(), "Slot written");
        Ok(())
    }
}

/// Process-local slot storage.
///
/// Nothing survives the process. Reads and writes can be made to fail for
/// exercising the store's best-effort persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: HashMap<Slot, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with already-encoded slot contents.
    #[must_use]
    pub fn with_slot(mut self, slot: Slot, raw: impl Into<String>) -> Self {
        self.slots.insert(slot, raw.into());
        self
    }

    /// Seed storage with entries for a slot.
    ///
    /// # Panics
    ///
    /// Panics if the entries cannot be encoded, which does not happen for
    /// well-formed entries.
    #[must_use]
    pub fn with_entries(self, slot: Slot, entries: &[Entry]) -> Self {
        let raw = serde_json::to_string(entries).expect("entries encode as JSON");
        self.with_slot(slot, raw)
    }

    /// Make every read fail.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every write fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Raw contents of a slot.
    #[must_use]
    pub fn raw(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }
}

impl Repository for MemoryStorage {
    fn read_slot(&self, slot: Slot) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(Error::internal(format!("read of {slot} slot refused")));
        }
        Ok(self.slots.get(&slot).cloned())
    }

    fn write_slot(&mut self, slot: Slot, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::internal(format!("write of {slot} slot refused")));
        }
        self.slots.insert(slot, value.to_string());
        self.writes += 1;
        Ok(())
    }
}
