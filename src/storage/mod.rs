// src/storage/mod.rs — SQLite persistence

pub mod schema;
pub mod store;

use rusqlite::Connection;
use std::path::Path;

pub use store::{DiagnosticSession, FaultEntry, Store};

/// Owner of the SQLite connection.
pub struct StorageManager {
    pub store: Store,
}

impl StorageManager {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // WAL for concurrent readers while a request commits
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        schema::run_migrations(&conn)?;

        Ok(Self {
            store: Store::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            store: Store::new(conn),
        })
    }
}
