//! Record operations shared by every client.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::{LocalCacheStore, Observation};
use crate::models::{Record, RecordId};
use crate::remote::RemoteSource;
use crate::state::SyncState;
use crate::sync::SyncCoordinator;
use crate::util::unix_timestamp_millis;
use crate::{Error, Result};

/// Reads come from the cache. Mutations go to the remote store first and
/// are cached once it accepts them.
#[derive(Clone)]
pub struct RecordService {
    cache: LocalCacheStore,
    remote: Arc<dyn RemoteSource>,
    coordinator: SyncCoordinator,
}

impl RecordService {
    pub fn new(
        cache: LocalCacheStore,
        remote: Arc<dyn RemoteSource>,
        coordinator: SyncCoordinator,
    ) -> Self {
        Self {
            cache,
            remote,
            coordinator,
        }
    }

    pub const fn cache(&self) -> &LocalCacheStore {
        &self.cache
    }

    pub const fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn observe_all(&self) -> Observation<Vec<Record>> {
        self.cache.observe_all()
    }

    pub fn observe_by_id(&self, id: &RecordId) -> Observation<Option<Record>> {
        self.cache.observe_by_id(id)
    }

    pub fn observe_favorites(&self) -> Observation<Vec<Record>> {
        self.cache.observe_favorites()
    }

    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        self.cache.get(id).await
    }

    /// Case-insensitive substring search over the cache. A blank query
    /// returns every record.
    pub async fn search(&self, query: &str) -> Result<Vec<Record>> {
        self.cache.search_by_text(query).await
    }

    /// Set the local favorite flag. Nothing is sent to the remote store.
    pub async fn toggle_favorite(&self, id: &RecordId, is_favorite: bool) -> Result<()> {
        if self.cache.set_favorite(id, is_favorite).await? {
            tracing::debug!("Favorite for {} set to {}", id, is_favorite);
            Ok(())
        } else {
            Err(Error::NotFound(id.to_string()))
        }
    }

    /// Create a record owned by `caller_id`.
    pub async fn create(&self, mut record: Record, caller_id: &str) -> Result<Record> {
        let caller_id = require_caller(caller_id)?;
        validate(&record)?;

        if record.id.is_blank() {
            record.id = RecordId::new();
        }
        let now = unix_timestamp_millis();
        record.created_by = caller_id.to_string();
        record.updated_by = caller_id.to_string();
        record.created_at = now;
        record.updated_at = now;
        record.version = 1;

        let id = self.remote.create(&record).await?;
        if !id.is_blank() {
            record.id = id;
        }
        self.cache.upsert_one(&record).await?;

        tracing::info!("Created record {}", record.id);
        Ok(record)
    }

    /// Update a record. Only its creator or an admin may do this.
    ///
    /// Ownership and creation stamps come from the stored copy, so an
    /// update can never transfer a record to someone else.
    pub async fn update(&self, mut record: Record, caller_id: &str, is_admin: bool) -> Result<Record> {
        let caller_id = require_caller(caller_id)?;
        validate(&record)?;

        let existing = self.load_for_mutation(&record.id).await?;
        if !existing.can_be_modified_by(caller_id, is_admin) {
            return Err(Error::ownership(record.id.as_str(), caller_id));
        }

        record.created_by = existing.created_by;
        record.created_at = existing.created_at;
        record.updated_by = caller_id.to_string();
        record.updated_at = unix_timestamp_millis();
        record.version = existing.version + 1;
        record.is_favorite = existing.is_favorite;

        self.remote.update(&record).await?;
        self.cache.upsert_one(&record).await?;

        tracing::info!("Updated record {} to version {}", record.id, record.version);
        Ok(record)
    }

    /// Delete a record. A caller who is neither its creator nor an admin is
    /// rejected before the remote store is asked to delete anything.
    pub async fn delete(&self, id: &RecordId, caller_id: &str, is_admin: bool) -> Result<()> {
        let existing = self.load_for_mutation(id).await?;
        if !existing.can_be_modified_by(caller_id, is_admin) {
            tracing::warn!("Rejected delete of {} by {:?}", id, caller_id);
            return Err(Error::ownership(id.as_str(), caller_id));
        }

        self.remote.delete(id).await?;
        self.cache.delete_by_id(id).await?;

        tracing::info!("Deleted record {}", id);
        Ok(())
    }

    pub async fn sync_now(&self) -> SyncState {
        self.coordinator.sync_now().await
    }

    pub fn trigger_sync(&self) -> JoinHandle<SyncState> {
        self.coordinator.trigger_sync()
    }

    pub fn observe_sync_state(&self) -> watch::Receiver<SyncState> {
        self.coordinator.observe_sync_state()
    }

    pub async fn last_synced_at(&self) -> Result<Option<i64>> {
        self.cache.last_synced_at().await
    }

    async fn load_for_mutation(&self, id: &RecordId) -> Result<Record> {
        if let Some(record) = self.cache.get(id).await? {
            return Ok(record);
        }
        self.remote
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

fn require_caller(caller_id: &str) -> Result<&str> {
    let caller_id = caller_id.trim();
    if caller_id.is_empty() {
        return Err(Error::InvalidInput("caller id must not be empty".to_string()));
    }
    Ok(caller_id)
}

fn validate(record: &Record) -> Result<()> {
    if record.name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    Ok(())
}
