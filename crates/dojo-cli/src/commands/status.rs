use serde::Serialize;

use crate::commands::common::{format_sync_timestamp, Workspace};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub db_path: Option<String>,
    pub records: usize,
    pub favorites: usize,
    pub last_synced_at: Option<i64>,
    pub api_base_url: Option<String>,
    pub collection: String,
    pub auth_configured: bool,
}

pub async fn run_status(workspace: &Workspace, as_json: bool) -> Result<(), CliError> {
    let report = build_status(workspace).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in format_status_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn build_status(workspace: &Workspace) -> Result<StatusReport, CliError> {
    let snapshot = workspace.cache.snapshot();
    Ok(StatusReport {
        db_path: workspace
            .cache
            .path()
            .map(|path| path.display().to_string()),
        records: snapshot.len(),
        favorites: snapshot.iter().filter(|record| record.is_favorite).count(),
        last_synced_at: workspace.cache.last_synced_at().await?,
        api_base_url: workspace.config.api_base_url.clone(),
        collection: workspace.config.collection.clone(),
        auth_configured: workspace.config.supabase.is_some(),
    })
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    vec![
        format!(
            "cache:       {}",
            report.db_path.as_deref().unwrap_or("(in memory)")
        ),
        format!(
            "characters:  {} ({} favorites)",
            report.records, report.favorites
        ),
        format!(
            "last sync:   {}",
            report
                .last_synced_at
                .map_or_else(|| "never".to_string(), format_sync_timestamp)
        ),
        format!(
            "remote:      {}/{}",
            report.api_base_url.as_deref().unwrap_or("(not configured)"),
            report.collection
        ),
        format!(
            "auth:        {}",
            if report.auth_configured {
                "supabase"
            } else {
                "not configured"
            }
        ),
    ]
}
