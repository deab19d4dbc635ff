//! Record source over a document store, with retry and auth escalation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::escalation::AuthEscalator;
use super::wire::{document_from_value, document_to_record, record_to_document};
use super::{DocumentStore, RemoteSource};
use crate::auth::IdentityProvider;
use crate::models::{Record, RecordId};
use crate::retry::{self, RetryPolicy};
use crate::Result;

pub struct DocumentRemoteSource {
    store: Arc<dyn DocumentStore>,
    collection: String,
    escalator: AuthEscalator,
    policy: RetryPolicy,
}

impl DocumentRemoteSource {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        identity: Arc<dyn IdentityProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            escalator: AuthEscalator::new(identity),
            policy,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Run one remote invocation: retries wrap the call, and a single
    /// escalation budget is shared by all of them.
    async fn invoke<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = &self.escalator.scope();
        let call = &call;
        retry::execute(&self.policy, move || scope.run(call)).await
    }
}

#[async_trait]
impl RemoteSource for DocumentRemoteSource {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let documents = self
            .invoke(|| self.store.list_documents(&self.collection))
            .await?;

        let total = documents.len();
        let records: Vec<Record> = documents
            .into_iter()
            .filter_map(|value| match decode_record(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!("Skipping remote document: {}", error);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Fetched {} of {} documents from {}",
            records.len(),
            total,
            self.collection
        );
        Ok(records)
    }

    async fn fetch_by_id(&self, id: &RecordId) -> Result<Option<Record>> {
        let document = self
            .invoke(|| self.store.get_document(&self.collection, id.as_str()))
            .await?;
        document.as_ref().map(document_to_record).transpose()
    }

    async fn create(&self, record: &Record) -> Result<RecordId> {
        let document = record_to_document(record)?;
        let id = self
            .invoke(|| self.store.create_document(&self.collection, &document))
            .await?;
        Ok(RecordId::from(id))
    }

    async fn update(&self, record: &Record) -> Result<()> {
        let document = record_to_document(record)?;
        self.invoke(|| self.store.update_document(&self.collection, &document))
            .await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.invoke(|| self.store.delete_document(&self.collection, id.as_str()))
            .await
    }
}

fn decode_record(value: serde_json::Value) -> Result<Record> {
    document_to_record(&document_from_value(value)?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::remote::Document;
    use crate::test_support::{FakeDocumentStore, FakeIdentity};
    use crate::Error;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100), Duration::from_millis(2_000), 2.0)
    }

    fn source(store: &Arc<FakeDocumentStore>, identity: &Arc<FakeIdentity>) -> DocumentRemoteSource {
        DocumentRemoteSource::new(
            Arc::clone(store) as Arc<dyn DocumentStore>,
            "characters",
            Arc::clone(identity) as Arc<dyn IdentityProvider>,
            policy(),
        )
    }

    fn document(id: &str, fields: serde_json::Value) -> Document {
        Document {
            id: id.to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let store = Arc::new(FakeDocumentStore::with_documents(vec![
            document("jin", json!({ "name": "Jin" })),
            document("kazuya", json!({ "name": "Kazuya" })),
            document("nina", json!({ "name": "Nina", "moveList": "{broken" })),
            document("law", json!({ "name": "Law" })),
            document("paul", json!({ "name": "Paul" })),
        ]));
        let identity = Arc::new(FakeIdentity::signed_in("u1"));

        let records = source(&store, &identity).fetch_all().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["jin", "kazuya", "law", "paul"]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_within_budget() {
        let store = Arc::new(FakeDocumentStore::with_documents(vec![document(
            "jin",
            json!({ "name": "Jin" }),
        )]));
        store.fail_next(Error::Network("timeout".to_string()));
        store.fail_next(Error::Network("timeout".to_string()));
        let identity = Arc::new(FakeIdentity::signed_in("u1"));

        let records = source(&store, &identity).fetch_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_network_failure_gives_up_after_three_attempts() {
        let store = Arc::new(FakeDocumentStore::default());
        for _ in 0..5 {
            store.fail_next(Error::Network("unavailable".to_string()));
        }
        let identity = Arc::new(FakeIdentity::signed_in("u1"));

        let error = source(&store, &identity).fetch_all().await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unauthorized_fetch_escalates_once() {
        let store = Arc::new(FakeDocumentStore::with_documents(vec![document(
            "jin",
            json!({ "name": "Jin" }),
        )]));
        store.fail_next(Error::Unauthorized("permission denied".to_string()));
        let identity = Arc::new(FakeIdentity::anonymous());

        let records = source(&store, &identity).fetch_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(identity.creations.load(Ordering::SeqCst), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn combined_attempts_never_exceed_budget_plus_one() {
        let store = Arc::new(FakeDocumentStore::default());
        for _ in 0..10 {
            store.fail_next(Error::Unauthorized("permission denied".to_string()));
            store.fail_next(Error::Network("unavailable".to_string()));
        }
        let identity = Arc::new(FakeIdentity::anonymous());

        assert!(source(&store, &identity).fetch_all().await.is_err());
        assert!(store.calls.load(Ordering::SeqCst) <= 4);
        assert_eq!(identity.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_never_sends_favorite_flag() {
        let store = Arc::new(FakeDocumentStore::default());
        let identity = Arc::new(FakeIdentity::signed_in("u1"));
        let mut record = Record::new("jin", "Jin");
        record.is_favorite = true;

        let id = source(&store, &identity).create(&record).await.unwrap();
        assert_eq!(id.as_str(), "jin");

        let stored = store.document("jin").unwrap();
        assert!(!stored.fields.contains_key("isFavorite"));
        assert_eq!(stored.fields["name"], json!("Jin"));
    }

    #[tokio::test]
    async fn fetch_by_id_decodes_or_returns_none() {
        let store = Arc::new(FakeDocumentStore::with_documents(vec![document(
            "jin",
            json!({ "name": "Jin", "version": 2 }),
        )]));
        let identity = Arc::new(FakeIdentity::signed_in("u1"));
        let source = source(&store, &identity);

        let found = source.fetch_by_id(&RecordId::from("jin")).await.unwrap().unwrap();
        assert_eq!(found.version, 2);
        assert!(source.fetch_by_id(&RecordId::from("nina")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete_reach_the_store() {
        let store = Arc::new(FakeDocumentStore::with_documents(vec![document(
            "jin",
            json!({ "name": "Jin" }),
        )]));
        let identity = Arc::new(FakeIdentity::signed_in("u1"));
        let source = source(&store, &identity);

        let mut record = Record::new("jin", "Jin Kazama");
        record.version = 2;
        source.update(&record).await.unwrap();
        assert_eq!(store.document("jin").unwrap().fields["name"], json!("Jin Kazama"));

        source.delete(&RecordId::from("jin")).await.unwrap();
        assert!(store.document("jin").is_none());
    }
}
