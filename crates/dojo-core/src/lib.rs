//! dojo-core - Core library for Dojo
//!
//! Offline-first access to a shared fighting-game character roster: a local
//! SQLite cache that clients read from, a remote document store that is the
//! source of truth, and the sync machinery that keeps the two in step
//! without losing local favorites.

pub mod auth;
pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod retry;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{Record, RecordId};
pub use services::RecordService;
pub use state::SyncState;
