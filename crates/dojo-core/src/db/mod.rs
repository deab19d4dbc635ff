//! Local cache layer for Dojo

mod cache;
mod connection;
mod metadata_repository;
mod migrations;
mod observation;
mod repository;

pub use cache::LocalCacheStore;
pub use connection::Database;
pub use metadata_repository::{MetadataRepository, SqliteMetadataRepository};
pub use observation::Observation;
pub use repository::{RecordRepository, SqliteRecordRepository};
