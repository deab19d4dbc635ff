//! Client configuration.
//!
//! `ClientConfig` is read from environment variables (the CLI loads `.env`
//! first) and tells every client where the remote store, the Supabase
//! project, and the local cache live, plus how hard to retry.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::resolve_optional_supabase_config;
use crate::retry::RetryPolicy;
use crate::sync::SyncSettings;
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_API_BASE_URL: &str = "DOJO_API_BASE_URL";
pub const ENV_COLLECTION: &str = "DOJO_COLLECTION";
pub const ENV_DB_PATH: &str = "DOJO_DB_PATH";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_RETRY_ATTEMPTS: &str = "DOJO_RETRY_ATTEMPTS";
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "DOJO_RETRY_INITIAL_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "DOJO_RETRY_MAX_DELAY_MS";
pub const ENV_RETRY_BACKOFF_FACTOR: &str = "DOJO_RETRY_BACKOFF_FACTOR";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DOJO_HTTP_TIMEOUT_SECS";
pub const ENV_SYNC_REARM_SECS: &str = "DOJO_SYNC_REARM_SECS";

pub const DEFAULT_COLLECTION: &str = "characters";
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 100;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;
const DEFAULT_RETRY_BACKOFF_FACTOR: f64 = 2.0;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SYNC_REARM_SECS: u64 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl From<ConfigError> for crate::Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

/// Supabase project the identity provider talks to.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Document API root. Without it the client works from the cache only.
    pub api_base_url: Option<String>,
    pub collection: String,
    /// Cache location. `None` lets the client pick its platform default.
    pub db_path: Option<PathBuf>,
    pub supabase: Option<SupabaseConfig>,
    pub retry_attempts: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
    pub retry_backoff_factor: f64,
    pub http_timeout: Duration,
    /// `None` keeps terminal sync states until the next trigger.
    pub rearm_delay: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            collection: DEFAULT_COLLECTION.to_string(),
            db_path: None,
            supabase: None,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_initial_delay: Duration::from_millis(DEFAULT_RETRY_INITIAL_DELAY_MS),
            retry_max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            retry_backoff_factor: DEFAULT_RETRY_BACKOFF_FACTOR,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            rearm_delay: Some(Duration::from_secs(DEFAULT_SYNC_REARM_SECS)),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| normalize_text_option(lookup(key));
        let defaults = Self::default();

        let api_base_url = get(ENV_API_BASE_URL)
            .map(|url| normalize_http_url(ENV_API_BASE_URL, &url))
            .transpose()?;

        let supabase = resolve_optional_supabase_config(
            get(ENV_SUPABASE_URL),
            get(ENV_SUPABASE_ANON_KEY),
        )
        .map_err(|_| ConfigError::Invalid {
            key: ENV_SUPABASE_ANON_KEY,
            message: format!("set both {ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY}, or neither"),
        })?
        .map(|(url, anon_key)| SupabaseConfig { url, anon_key });

        let retry_attempts = parse_or(&get, ENV_RETRY_ATTEMPTS, defaults.retry_attempts)?;
        if retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_RETRY_ATTEMPTS,
                message: "must be at least 1".to_string(),
            });
        }

        let retry_backoff_factor =
            parse_or(&get, ENV_RETRY_BACKOFF_FACTOR, defaults.retry_backoff_factor)?;
        if !retry_backoff_factor.is_finite() || retry_backoff_factor < 1.0 {
            return Err(ConfigError::Invalid {
                key: ENV_RETRY_BACKOFF_FACTOR,
                message: "must be a number >= 1.0".to_string(),
            });
        }

        let http_timeout_secs = parse_or(&get, ENV_HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_HTTP_TIMEOUT_SECS,
                message: "must be at least 1".to_string(),
            });
        }

        let rearm_secs = parse_or(&get, ENV_SYNC_REARM_SECS, DEFAULT_SYNC_REARM_SECS)?;

        Ok(Self {
            api_base_url,
            collection: get(ENV_COLLECTION).unwrap_or(defaults.collection),
            db_path: get(ENV_DB_PATH).map(PathBuf::from),
            supabase,
            retry_attempts,
            retry_initial_delay: Duration::from_millis(parse_or(
                &get,
                ENV_RETRY_INITIAL_DELAY_MS,
                DEFAULT_RETRY_INITIAL_DELAY_MS,
            )?),
            retry_max_delay: Duration::from_millis(parse_or(
                &get,
                ENV_RETRY_MAX_DELAY_MS,
                DEFAULT_RETRY_MAX_DELAY_MS,
            )?),
            retry_backoff_factor,
            http_timeout: Duration::from_secs(http_timeout_secs),
            rearm_delay: (rearm_secs > 0).then(|| Duration::from_secs(rearm_secs)),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            self.retry_initial_delay,
            self.retry_max_delay,
            self.retry_backoff_factor,
        )
    }

    pub const fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            rearm_delay: self.rearm_delay,
        }
    }

    pub fn require_api_base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_API_BASE_URL))
    }
}

fn normalize_http_url(key: &'static str, value: &str) -> Result<String, ConfigError> {
    if is_http_url(value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::Invalid {
            key,
            message: "must include http:// or https://".to_string(),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|error: T::Err| ConfigError::Invalid {
            key,
            message: format!("{raw:?}: {error}"),
        }),
    }
}
