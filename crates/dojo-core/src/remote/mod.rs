//! Access to the authoritative remote record store.

mod escalation;
mod http;
mod source;
pub mod wire;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Record, RecordId};
use crate::Result;

pub use escalation::{AuthEscalator, EscalationScope};
pub use http::HttpDocumentStore;
pub use source::DocumentRemoteSource;
pub use wire::Document;

/// Record-level operations against the remote store.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every decodable record. Malformed documents are skipped.
    async fn fetch_all(&self) -> Result<Vec<Record>>;

    async fn fetch_by_id(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Store a new record and return the id the store assigned.
    async fn create(&self, record: &Record) -> Result<RecordId>;

    async fn update(&self, record: &Record) -> Result<()>;

    async fn delete(&self, id: &RecordId) -> Result<()>;
}

/// Raw document transport underneath a `RemoteSource`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Raw list elements, decoded one by one with `wire::document_from_value`.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>>;

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn create_document(&self, collection: &str, document: &Document) -> Result<String>;

    async fn update_document(&self, collection: &str, document: &Document) -> Result<()>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}
