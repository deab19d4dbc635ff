//! Merge a full remote snapshot into the local cache.

use std::collections::HashSet;

use crate::db::{LocalCacheStore, RecordRepository, SqliteRecordRepository};
use crate::models::{Record, RecordId};
use crate::Result;

/// What one reconciliation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub written: usize,
    pub favorites_kept: usize,
}

/// Writes remote snapshots into the cache without losing local favorites.
///
/// Records missing from a snapshot stay cached.
#[derive(Clone)]
pub struct Reconciler {
    cache: LocalCacheStore,
}

impl Reconciler {
    pub const fn new(cache: LocalCacheStore) -> Self {
        Self { cache }
    }

    /// Stamp each remote record with its cached favorite flag and upsert the
    /// lot. The favorite read and the writes share one transaction.
    pub async fn reconcile(&self, snapshot: Vec<Record>) -> Result<ReconcileSummary> {
        let summary = self
            .cache
            .write_transaction(move |tx| {
                let repo = SqliteRecordRepository::new(tx);
                let favorites = repo.favorite_ids()?;
                let stamped = stamp_favorites(snapshot, &favorites);

                let mut summary = ReconcileSummary::default();
                for record in &stamped {
                    repo.upsert(record)?;
                    summary.written += 1;
                    if record.is_favorite {
                        summary.favorites_kept += 1;
                    }
                }
                Ok(summary)
            })
            .await?;

        tracing::debug!(
            "Reconciled {} records ({} favorites kept)",
            summary.written,
            summary.favorites_kept
        );
        Ok(summary)
    }
}

/// Set `is_favorite` from the local favorite set; every other field is kept.
pub fn stamp_favorites(snapshot: Vec<Record>, favorites: &HashSet<RecordId>) -> Vec<Record> {
    snapshot
        .into_iter()
        .map(|mut record| {
            record.is_favorite = favorites.contains(&record.id);
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: &str, name: &str) -> Record {
        Record::new(id, name)
    }

    #[test]
    fn stamp_overrides_remote_flag() {
        let mut remote = record("jin", "Jin");
        remote.is_favorite = true;
        let stamped = stamp_favorites(
            vec![remote, record("nina", "Nina")],
            &HashSet::from([RecordId::from("nina")]),
        );

        assert!(!stamped[0].is_favorite);
        assert!(stamped[1].is_favorite);
        assert_eq!(stamped[0].name, "Jin");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_sync_fills_empty_cache() {
        let cache = LocalCacheStore::open_in_memory().unwrap();
        let reconciler = Reconciler::new(cache.clone());

        let summary = reconciler
            .reconcile(vec![record("a", "A"), record("b", "B")])
            .await
            .unwrap();

        assert_eq!(summary, ReconcileSummary { written: 2, favorites_kept: 0 });
        let cached = cache.snapshot();
        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|record| !record.is_favorite));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn favorite_survives_remote_rename() {
        let cache = LocalCacheStore::open_in_memory().unwrap();
        let mut cached = record("a", "Old");
        cached.is_favorite = true;
        cache.upsert_one(&cached).await.unwrap();

        let summary = Reconciler::new(cache.clone())
            .reconcile(vec![record("a", "New")])
            .await
            .unwrap();

        assert_eq!(summary.favorites_kept, 1);
        let stored = cache.get(&RecordId::from("a")).await.unwrap().unwrap();
        assert_eq!(stored.name, "New");
        assert!(stored.is_favorite);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconcile_is_idempotent() {
        let cache = LocalCacheStore::open_in_memory().unwrap();
        cache.upsert_one(&record("nina", "Nina")).await.unwrap();
        cache.set_favorite(&RecordId::from("nina"), true).await.unwrap();
        let reconciler = Reconciler::new(cache.clone());
        let snapshot = vec![record("jin", "Jin"), record("nina", "Nina Williams")];

        reconciler.reconcile(snapshot.clone()).await.unwrap();
        let once = cache.snapshot();
        reconciler.reconcile(snapshot).await.unwrap();

        assert_eq!(cache.snapshot(), once);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn records_missing_remotely_are_kept() {
        let cache = LocalCacheStore::open_in_memory().unwrap();
        cache.upsert_one(&record("gone", "Gone")).await.unwrap();

        Reconciler::new(cache.clone())
            .reconcile(vec![record("jin", "Jin")])
            .await
            .unwrap();

        assert!(cache.get(&RecordId::from("gone")).await.unwrap().is_some());
        assert_eq!(cache.snapshot().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_reconcile_leaves_cache_untouched() {
        let cache = LocalCacheStore::open_in_memory().unwrap();
        cache.upsert_one(&record("jin", "Jin")).await.unwrap();

        let result = Reconciler::new(cache.clone())
            .reconcile(vec![record("jin", "Jin Kazama"), record(" ", "Blank")])
            .await;

        assert!(result.is_err());
        let stored = cache.get(&RecordId::from("jin")).await.unwrap().unwrap();
        assert_eq!(stored.name, "Jin");
    }
}
