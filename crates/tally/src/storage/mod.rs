//! Storage layer for tally.
//!
//! This module provides `SQLite`-based persistent storage for the single
//! total record, plus the [`RecordStore`] seam the controller talks to.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::TotalRecord;

/// Process-wide store, opened on first use by [`Storage::shared`].
static SHARED: OnceLock<Mutex<Storage>> = OnceLock::new();

/// Get, insert and update access to total records.
///
/// Implemented by [`Storage`], by a mutex-guarded [`Storage`], and by
/// [`UnavailableStore`] for when the database could not be opened.
pub trait RecordStore {
    /// Fetch the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, id: i64) -> Result<Option<TotalRecord>>;

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written or the id is taken.
    fn insert(&self, record: &TotalRecord) -> Result<()>;

    /// Overwrite an existing record. Returns `false` if no record matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn update(&self, record: &TotalRecord) -> Result<bool>;
}

/// Storage engine for the total record.
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
    /// Initializes the schema if this is a new database, and resets it if the
    /// schema version does not match.
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

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
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

    /// Get the process-wide store, opening it at `path` on first call.
    ///
    /// Later calls return the same instance and ignore `path`. A failed open
    /// leaves nothing cached, so the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns an error if the database has to be opened and that fails.
    pub fn shared(path: impl AsRef<Path>) -> Result<&'static Mutex<Storage>> {
        if let Some(storage) = SHARED.get() {
            return Ok(storage);
        }
        let storage = Self::open(path)?;
        Ok(SHARED.get_or_init(|| Mutex::new(storage)))
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a record by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<TotalRecord>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, value, last_updated FROM total WHERE id = ?1",
                [id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(result)
    }

    /// Insert a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when a
    /// record with the same id already exists.
    pub fn insert(&self, record: &TotalRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO total (id, value, last_updated) VALUES (?1, ?2, ?3)",
            params![record.id, record.value, record.last_updated],
        )?;
        debug!("Inserted total record {} = {}", record.id, record.value);
        Ok(())
    }

    /// Overwrite the record with the same id.
    ///
    /// Returns `true` if a record was updated, `false` if none matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update(&self, record: &TotalRecord) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE total SET value = ?2, last_updated = ?3 WHERE id = ?1",
            params![record.id, record.value, record.last_updated],
        )?;
        debug!(
            "Updated total record {} = {} ({} row(s))",
            record.id, record.value, affected
        );
        Ok(affected > 0)
    }

    /// Count stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM total", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to a `TotalRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TotalRecord> {
        Ok(TotalRecord {
            id: row.get(0)?,
            value: row.get(1)?,
            last_updated: row.get(2)?,
        })
    }
}

impl RecordStore for Storage {
    fn get(&self, id: i64) -> Result<Option<TotalRecord>> {
        Storage::get(self, id)
    }

    fn insert(&self, record: &TotalRecord) -> Result<()> {
        Storage::insert(self, record)
    }

    fn update(&self, record: &TotalRecord) -> Result<bool> {
        Storage::update(self, record)
    }
}

impl RecordStore for Mutex<Storage> {
    fn get(&self, id: i64) -> Result<Option<TotalRecord>> {
        lock(self)?.get(id)
    }

    fn insert(&self, record: &TotalRecord) -> Result<()> {
        lock(self)?.insert(record)
    }

    fn update(&self, record: &TotalRecord) -> Result<bool> {
        lock(self)?.update(record)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn get(&self, id: i64) -> Result<Option<TotalRecord>> {
        (**self).get(id)
    }

    fn insert(&self, record: &TotalRecord) -> Result<()> {
        (**self).insert(record)
    }

    fn update(&self, record: &TotalRecord) -> Result<bool> {
        (**self).update(record)
    }
}

fn lock(storage: &Mutex<Storage>) -> Result<std::sync::MutexGuard<'_, Storage>> {
    storage
        .lock()
        .map_err(|_| Error::internal("storage mutex poisoned"))
}

/// A store that failed to open. Every operation reports why.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    /// Create an unavailable store carrying the open failure.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the store is unavailable.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl RecordStore for UnavailableStore {
    fn get(&self, _id: i64) -> Result<Option<TotalRecord>> {
        Err(Error::store_unavailable(self.reason.clone()))
    }

    fn insert(&self, _record: &TotalRecord) -> Result<()> {
        Err(Error::store_unavailable(self.reason.clone()))
    }

    fn update(&self, _record: &TotalRecord) -> Result<bool> {
        Err(Error::store_unavailable(self.reason.clone()))
    }
}
