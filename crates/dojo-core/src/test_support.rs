//! Hand-written fakes for the remote and identity boundaries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::auth::IdentityProvider;
use crate::models::{Record, RecordId};
use crate::remote::{Document, DocumentStore, RemoteSource};
use crate::{Error, Result};

pub struct FakeIdentity {
    pub present: AtomicBool,
    pub fail_creation: bool,
    pub creations: AtomicUsize,
    user_id: String,
}

impl FakeIdentity {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            present: AtomicBool::new(true),
            fail_creation: false,
            creations: AtomicUsize::new(0),
            user_id: user_id.to_string(),
        }
    }

    /// No identity yet; escalation creates one.
    pub fn anonymous() -> Self {
        Self {
            present: AtomicBool::new(false),
            ..Self::signed_in("anon-1")
        }
    }

    /// No identity, and creating one fails.
    pub fn unavailable() -> Self {
        Self {
            fail_creation: true,
            ..Self::anonymous()
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn has_identity(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    async fn create_anonymous_identity(&self) -> Result<()> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        if self.fail_creation {
            return Err(Error::Auth("anonymous sign-ins are disabled".to_string()));
        }
        self.present.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn current_user_id(&self) -> Option<String> {
        self.present
            .load(Ordering::SeqCst)
            .then(|| self.user_id.clone())
    }

    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .present
            .load(Ordering::SeqCst)
            .then(|| format!("token-{}", self.user_id)))
    }
}

/// In-memory document store that fails with scripted errors first.
#[derive(Default)]
pub struct FakeDocumentStore {
    documents: Mutex<Vec<Document>>,
    failures: Mutex<VecDeque<Error>>,
    pub calls: AtomicUsize,
}

impl FakeDocumentStore {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, error: Error) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|document| document.id == id)
            .cloned()
    }

    fn begin(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.failures.lock().unwrap().pop_front().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn list_documents(&self, _collection: &str) -> Result<Vec<serde_json::Value>> {
        self.begin()?;
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .map(|document| serde_json::to_value(document).unwrap())
            .collect())
    }

    async fn get_document(&self, _collection: &str, id: &str) -> Result<Option<Document>> {
        self.begin()?;
        Ok(self.document(id))
    }

    async fn create_document(&self, _collection: &str, document: &Document) -> Result<String> {
        self.begin()?;
        self.documents.lock().unwrap().push(document.clone());
        Ok(document.id.clone())
    }

    async fn update_document(&self, _collection: &str, document: &Document) -> Result<()> {
        self.begin()?;
        let mut documents = self.documents.lock().unwrap();
        match documents.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document.clone(),
            None => return Err(Error::Remote {
                status: 404,
                message: "not found".to_string(),
            }),
        }
        Ok(())
    }

    async fn delete_document(&self, _collection: &str, id: &str) -> Result<()> {
        self.begin()?;
        self.documents
            .lock()
            .unwrap()
            .retain(|document| document.id != id);
        Ok(())
    }
}

/// Record-level remote fake with an optional gate that holds `fetch_all`.
#[derive(Default)]
pub struct FakeRemote {
    records: Mutex<Vec<Record>>,
    failures: Mutex<VecDeque<Error>>,
    calls: Mutex<Vec<String>>,
    pub fetches: AtomicUsize,
    hold_fetches: AtomicBool,
    pub release: Notify,
}

impl FakeRemote {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_records(&self, records: Vec<Record>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fail_next(&self, error: Error) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Make `fetch_all` wait for `release.notify_one()`.
    pub fn hold_fetches(&self) {
        self.hold_fetches.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn record(&self, id: &str) -> Option<Record> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id.as_str() == id)
            .cloned()
    }

    fn begin(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        self.failures.lock().unwrap().pop_front().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.hold_fetches.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.begin("fetch_all".to_string())?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn fetch_by_id(&self, id: &RecordId) -> Result<Option<Record>> {
        self.begin(format!("fetch_by_id:{id}"))?;
        Ok(self.record(id.as_str()))
    }

    async fn create(&self, record: &Record) -> Result<RecordId> {
        self.begin(format!("create:{}", record.id))?;
        let mut stored = record.clone();
        stored.is_favorite = false;
        self.records.lock().unwrap().push(stored);
        Ok(record.id.clone())
    }

    async fn update(&self, record: &Record) -> Result<()> {
        self.begin(format!("update:{}", record.id))?;
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.iter_mut().find(|existing| existing.id == record.id) {
            *existing = record.clone();
            existing.is_favorite = false;
        }
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.begin(format!("delete:{id}"))?;
        self.records.lock().unwrap().retain(|record| &record.id != id);
        Ok(())
    }
}
