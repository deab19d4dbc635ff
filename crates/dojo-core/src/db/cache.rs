//! Observable local cache shared by the sync engine and the record service.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Transaction;
use tokio::sync::{watch, Mutex};

use super::observation::Observation;
use super::{
    Database, MetadataRepository, RecordRepository, SqliteMetadataRepository,
    SqliteRecordRepository,
};
use crate::models::{Record, RecordId};
use crate::Result;

/// Thread-safe record cache that republishes its contents after every write.
#[derive(Clone)]
pub struct LocalCacheStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
    snapshot: Arc<watch::Sender<Arc<Vec<Record>>>>,
}

impl LocalCacheStore {
    /// Open the cache at the given filesystem path.
    ///
    /// A file that SQLite refuses to read is moved aside and the cache starts
    /// empty; the next sync refills it.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = match Database::open(&db_path) {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local cache at {} is unreadable: {}. Starting from an empty cache.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path)?
            }
            Err(error) => return Err(error),
        };
        Self::from_database(db, Some(db_path))
    }

    /// Open an in-memory cache (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_database(Database::open_in_memory()?, None)
    }

    fn from_database(db: Database, db_path: Option<PathBuf>) -> Result<Self> {
        let records = SqliteRecordRepository::new(db.connection()).list_all()?;
        let (snapshot, _) = watch::channel(Arc::new(records));
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path,
            snapshot: Arc::new(snapshot),
        })
    }

    /// Filesystem location, `None` for in-memory caches.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("dojo.db");
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local cache from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        for suffix in ["-wal", "-shm"] {
            let mut sidecar = db_path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                std::fs::remove_file(&sidecar)?;
                tracing::warn!("Removed stale cache file {}", sidecar.display());
            }
        }

        Ok(())
    }

    /// Every cached record ordered by name.
    pub fn observe_all(&self) -> Observation<Vec<Record>> {
        Observation::new(self.snapshot.subscribe(), <[Record]>::to_vec)
    }

    /// A single record, `None` while it is not cached.
    pub fn observe_by_id(&self, id: &RecordId) -> Observation<Option<Record>> {
        let id = id.clone();
        Observation::new(self.snapshot.subscribe(), move |records: &[Record]| {
            records.iter().find(|record| record.id == id).cloned()
        })
    }

    /// Records the user marked as favorite.
    pub fn observe_favorites(&self) -> Observation<Vec<Record>> {
        Observation::new(self.snapshot.subscribe(), |records: &[Record]| {
            records
                .iter()
                .filter(|record| record.is_favorite)
                .cloned()
                .collect()
        })
    }

    /// Contents as of the last committed write.
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Fetch a cached record by id.
    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::new(db.connection()).get(id)
    }

    /// IDs currently marked favorite.
    pub async fn favorite_ids(&self) -> Result<HashSet<RecordId>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::new(db.connection()).favorite_ids()
    }

    /// Case-insensitive substring search. A blank query returns every record.
    pub async fn search_by_text(&self, query: &str) -> Result<Vec<Record>> {
        let db = self.db.lock().await;
        SqliteRecordRepository::new(db.connection()).search(query)
    }

    /// Insert or replace every record in one transaction.
    pub async fn upsert_many(&self, records: &[Record]) -> Result<()> {
        self.write_transaction(|tx| {
            let repo = SqliteRecordRepository::new(tx);
            records.iter().try_for_each(|record| repo.upsert(record))
        })
        .await
    }

    /// Insert or replace a single record.
    pub async fn upsert_one(&self, record: &Record) -> Result<()> {
        self.write_transaction(|tx| SqliteRecordRepository::new(tx).upsert(record))
            .await
    }

    /// Remove a record. Returns false when it was not cached.
    pub async fn delete_by_id(&self, id: &RecordId) -> Result<bool> {
        self.write_transaction(|tx| SqliteRecordRepository::new(tx).delete(id))
            .await
    }

    /// Remove every record. Returns the number removed.
    pub async fn delete_all(&self) -> Result<usize> {
        self.write_transaction(|tx| SqliteRecordRepository::new(tx).delete_all())
            .await
    }

    /// Set the local favorite flag. Returns false when the record is not cached.
    pub async fn set_favorite(&self, id: &RecordId, is_favorite: bool) -> Result<bool> {
        self.write_transaction(|tx| SqliteRecordRepository::new(tx).set_favorite(id, is_favorite))
            .await
    }

    /// Run `f` inside one SQLite transaction, then publish the new contents.
    ///
    /// Nothing is committed or published when `f` fails.
    pub async fn write_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        let output = f(&tx)?;
        let records = SqliteRecordRepository::new(&tx).list_all()?;
        tx.commit()?;

        self.snapshot.send_if_modified(|current| {
            if current.as_slice() == records.as_slice() {
                return false;
            }
            *current = Arc::new(records);
            true
        });
        Ok(output)
    }

    /// Unix ms of the last successful sync.
    pub async fn last_synced_at(&self) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        SqliteMetadataRepository::new(db.connection()).last_synced_at()
    }

    /// Remember that a sync completed at `timestamp_ms`.
    pub async fn record_sync_completed(&self, timestamp_ms: i64) -> Result<()> {
        let db = self.db.lock().await;
        SqliteMetadataRepository::new(db.connection()).set_last_synced_at(timestamp_ms)
    }
}
