//! Sync metadata repository implementation

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

const LAST_SYNCED_AT_KEY: &str = "last_synced_at";

/// Trait for local-only sync bookkeeping
pub trait MetadataRepository {
    /// Load a raw metadata value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a raw metadata value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Unix ms of the last successful sync, if any
    fn last_synced_at(&self) -> Result<Option<i64>> {
        Ok(self
            .get(LAST_SYNCED_AT_KEY)?
            .and_then(|value| value.trim().parse().ok()))
    }

    /// Remember when a sync completed
    fn set_last_synced_at(&self, timestamp_ms: i64) -> Result<()> {
        self.set(LAST_SYNCED_AT_KEY, &timestamp_ms.to_string())
    }
}

/// `SQLite` implementation of `MetadataRepository`
pub struct SqliteMetadataRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteMetadataRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MetadataRepository for SqliteMetadataRepository<'_> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM sync_metadata WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sync_metadata (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}
