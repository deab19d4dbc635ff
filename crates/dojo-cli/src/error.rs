use std::io;

use dojo_core::auth::AuthError;
use dojo_core::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] dojo_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Character ID cannot be empty")]
    EmptyRecordId,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Character not found: {0}")]
    RecordNotFound(String),
    #[error("Nothing to update; pass at least one field")]
    NothingToUpdate,
    #[error("Invalid details file {path}: {message}")]
    InvalidDetails { path: String, message: String },
    #[error("Sync failed: {0}")]
    SyncFailed(String),
    #[error(
        "Remote store is not configured. Set DOJO_API_BASE_URL (and SUPABASE_URL + SUPABASE_ANON_KEY for auth)."
    )]
    RemoteNotConfigured,
    #[error("Supabase auth is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY.")]
    AuthNotConfigured,
    #[error("No signed-in identity. Run `dojo auth login` or `dojo auth anonymous` first.")]
    NotSignedIn,
}
