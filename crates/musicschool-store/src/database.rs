//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Database handle shared between the cache and the embedded backend.
///
/// Guards are taken for the duration of one synchronous call and never held
/// across an `.await`.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database (tests, throwaway sessions).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Wrap this handle for sharing across services.
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

/// Platform data directory of the application.
pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("org", "ema", "musicschool").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().to_path_buf())
}

/// Lock a shared database, mapping poisoning to [`StoreError::LockPoisoned`].
pub fn lock(db: &SharedDatabase) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| StoreError::LockPoisoned)
}
