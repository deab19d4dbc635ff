use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use dojo_core::auth::{IdentityProvider, NoIdentity};
use dojo_core::config::ClientConfig;
use dojo_core::connectivity::ConnectivitySignal;
use dojo_core::db::LocalCacheStore;
use dojo_core::models::{Combo, FrameData, Move, Translations};
use dojo_core::remote::{DocumentRemoteSource, HttpDocumentStore, RemoteSource};
use dojo_core::sync::SyncCoordinator;
use dojo_core::{Record, RecordId, RecordService};
use serde::{Deserialize, Serialize};

use crate::auth::identity_from_config;
use crate::cli::RecordFields;
use crate::error::CliError;

const DB_FILE_NAME: &str = "dojo.db";

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub name: String,
    pub fighting_style: String,
    pub country: String,
    pub difficulty: String,
    pub is_favorite: bool,
    pub is_official: bool,
    pub version: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

/// Extra fields accepted from `--details <file>`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordDetails {
    pub stats: Option<BTreeMap<String, i64>>,
    pub move_list: Option<Vec<Move>>,
    pub combos: Option<Vec<Combo>>,
    pub frame_data: Option<BTreeMap<String, FrameData>>,
    pub translations: Option<Translations>,
    pub thumbnail_url: Option<String>,
    pub is_official: Option<bool>,
}

/// Cache plus the remote-backed service, when a remote store is configured.
pub struct Workspace {
    pub config: ClientConfig,
    pub cache: LocalCacheStore,
}

impl Workspace {
    pub fn open(cli_db_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let db_path = resolve_db_path(cli_db_path, &config);
        let cache = open_cache(&db_path)?;
        Ok(Self { config, cache })
    }

    pub fn identity(&self) -> Result<Arc<dyn IdentityProvider>, CliError> {
        Ok(match identity_from_config(&self.config)? {
            Some(identity) => Arc::new(identity) as Arc<dyn IdentityProvider>,
            None => Arc::new(NoIdentity) as Arc<dyn IdentityProvider>,
        })
    }

    /// Wire the record service against the configured document API.
    pub fn connect(
        &self,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<RecordService, CliError> {
        let base_url = self
            .config
            .api_base_url
            .as_deref()
            .ok_or(CliError::RemoteNotConfigured)?;

        let store = HttpDocumentStore::new(base_url, self.config.http_timeout, Arc::clone(&identity))?;
        let remote: Arc<dyn RemoteSource> = Arc::new(DocumentRemoteSource::new(
            Arc::new(store),
            self.config.collection.clone(),
            Arc::clone(&identity),
            self.config.retry_policy(),
        ));
        let coordinator = SyncCoordinator::new(
            Arc::clone(&remote),
            self.cache.clone(),
            identity,
            &ConnectivitySignal::new(true),
            self.config.sync_settings(),
        );
        Ok(RecordService::new(self.cache.clone(), remote, coordinator))
    }
}

/// User id for mutations. Creates an anonymous identity when none exists.
pub async fn resolve_caller_id(identity: &dyn IdentityProvider) -> Result<String, CliError> {
    if let Some(user_id) = identity.current_user_id().await {
        return Ok(user_id);
    }
    identity.create_anonymous_identity().await?;
    identity
        .current_user_id()
        .await
        .ok_or(CliError::NotSignedIn)
}

/// Caller for edits of existing records. Never creates an identity, since a
/// new one cannot own anything yet. Empty when signed out.
pub async fn existing_caller_id(identity: &dyn IdentityProvider) -> String {
    identity.current_user_id().await.unwrap_or_default()
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &ClientConfig) -> PathBuf {
    cli_db_path
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("dojo")
        .join(DB_FILE_NAME)
}

pub fn open_cache(path: &Path) -> Result<LocalCacheStore, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(LocalCacheStore::open(path)?)
}

pub fn normalize_record_id(id: &str) -> Result<RecordId, CliError> {
    id.parse::<RecordId>().map_err(|_| CliError::EmptyRecordId)
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn load_details(path: &Path) -> Result<RecordDetails, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| CliError::InvalidDetails {
        path: path.display().to_string(),
        message: error.to_string(),
    })
}

/// Copy the given fields onto `record`. Returns whether anything was set.
pub fn apply_fields(record: &mut Record, fields: &RecordFields) -> Result<bool, CliError> {
    let mut changed = false;
    let mut set = |target: &mut String, value: Option<&str>| {
        if let Some(value) = value {
            *target = value.trim().to_string();
            changed = true;
        }
    };
    set(&mut record.description, fields.description.as_deref());
    set(&mut record.fighting_style, fields.fighting_style.as_deref());
    set(&mut record.country, fields.country.as_deref());
    set(&mut record.difficulty, fields.difficulty.as_deref());
    set(&mut record.image_url, fields.image_url.as_deref());

    if let Some(path) = fields.details.as_deref() {
        apply_details(record, load_details(path)?);
        changed = true;
    }
    Ok(changed)
}

pub fn apply_details(record: &mut Record, details: RecordDetails) {
    if let Some(stats) = details.stats {
        record.stats = stats;
    }
    if let Some(move_list) = details.move_list {
        record.move_list = move_list;
    }
    if let Some(combos) = details.combos {
        record.combos = combos;
    }
    if let Some(frame_data) = details.frame_data {
        record.frame_data = frame_data;
    }
    if let Some(translations) = details.translations {
        record.translations = translations;
    }
    if let Some(thumbnail_url) = details.thumbnail_url {
        record.thumbnail_url = dojo_core::util::normalize_text_option(Some(thumbnail_url));
    }
    if let Some(is_official) = details.is_official {
        record.is_official = is_official;
    }
}

pub fn format_record_lines(records: &[Record]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            let marker = if record.is_favorite { "*" } else { " " };
            let short_id = record.id.as_str().chars().take(13).collect::<String>();
            let name = truncate(&record.name, 24);
            let style = truncate(&record.fighting_style, 20);
            format!(
                "{marker} {short_id:<13}  {name:<24}  {style:<20}  {}",
                format_relative_time(record.updated_at, now_ms)
            )
        })
        .collect()
}

pub fn record_to_list_item(record: &Record) -> RecordListItem {
    let now_ms = Utc::now().timestamp_millis();
    RecordListItem {
        id: record.id.to_string(),
        name: record.name.clone(),
        fighting_style: record.fighting_style.clone(),
        country: record.country.clone(),
        difficulty: record.difficulty.clone(),
        is_favorite: record.is_favorite,
        is_official: record.is_official,
        version: record.version,
        updated_at: record.updated_at,
        relative_time: format_relative_time(record.updated_at, now_ms),
    }
}

pub fn format_record_detail(record: &Record) -> String {
    let mut lines = vec![
        format!(
            "{}{}",
            record.name,
            if record.is_favorite { "  [favorite]" } else { "" }
        ),
        format!("id:          {}", record.id),
    ];
    let mut field = |label: &str, value: &str| {
        if !value.trim().is_empty() {
            lines.push(format!("{label:<12} {value}"));
        }
    };
    field("style:", &record.fighting_style);
    field("country:", &record.country);
    field("difficulty:", &record.difficulty);
    field("description:", &record.description);
    field("created by:", &record.created_by);

    lines.push(format!(
        "version:     {} (updated {})",
        record.version,
        format_sync_timestamp(record.updated_at)
    ));
    if !record.stats.is_empty() {
        let stats = record
            .stats
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("stats:       {stats}"));
    }
    for entry in &record.move_list {
        lines.push(format!(
            "  move  {:<20} {:<10} {}",
            entry.name, entry.command, entry.hit_level
        ));
    }
    for combo in &record.combos {
        lines.push(format!(
            "  combo {:<20} {} ({} dmg)",
            combo.name,
            combo.inputs.join(", "),
            combo.damage
        ));
    }
    lines.join("\n")
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
