use std::path::Path;

use dojo_core::auth::NoIdentity;
use dojo_core::config::ClientConfig;
use dojo_core::{Record, RecordId, SyncState};
use pretty_assertions::assert_eq;

use crate::cli::RecordFields;
use crate::commands::common::{
    apply_fields, existing_caller_id, format_record_detail, format_record_lines, format_relative_time,
    format_sync_timestamp, normalize_record_id, normalize_search_query, open_cache,
    record_to_list_item, resolve_caller_id, resolve_db_path, Workspace,
};
use crate::commands::delete::run_delete;
use crate::commands::favorite::run_favorite;
use crate::commands::status::{build_status, format_status_lines};
use crate::commands::sync::sync_outcome_message;
use crate::error::CliError;

fn workspace(dir: &Path) -> Workspace {
    Workspace {
        config: ClientConfig::default(),
        cache: open_cache(&dir.join("nested").join("dojo.db")).unwrap(),
    }
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn blank_ids_and_queries_are_rejected() {
    assert!(matches!(normalize_record_id("  "), Err(CliError::EmptyRecordId)));
    assert_eq!(normalize_record_id(" jin ").unwrap().as_str(), "jin");
    assert!(matches!(
        normalize_search_query(" "),
        Err(CliError::EmptySearchQuery)
    ));
    assert_eq!(normalize_search_query(" Jin ").unwrap(), "Jin");
}

#[test]
fn db_path_prefers_flag_then_config() {
    let config = ClientConfig {
        db_path: Some("/from/env.db".into()),
        ..ClientConfig::default()
    };
    assert_eq!(
        resolve_db_path(Some("/from/flag.db".into()), &config),
        Path::new("/from/flag.db")
    );
    assert_eq!(resolve_db_path(None, &config), Path::new("/from/env.db"));
    assert!(resolve_db_path(None, &ClientConfig::default()).ends_with("dojo/dojo.db"));
}

#[test]
fn apply_fields_reads_details_file() {
    let dir = tempfile::tempdir().unwrap();
    let details = dir.path().join("jin.json");
    std::fs::write(
        &details,
        r#"{
          "stats": { "power": 8 },
          "moveList": [{ "name": "Electric Wind God Fist", "command": "f,n,d,df+2" }],
          "isOfficial": true
        }"#,
    )
    .unwrap();

    let mut record = Record::new("jin", "Jin");
    let changed = apply_fields(
        &mut record,
        &RecordFields {
            fighting_style: Some(" Karate ".to_string()),
            details: Some(details),
            ..RecordFields::default()
        },
    )
    .unwrap();

    assert!(changed);
    assert_eq!(record.fighting_style, "Karate");
    assert_eq!(record.stats.get("power"), Some(&8));
    assert_eq!(record.move_list[0].command, "f,n,d,df+2");
    assert!(record.is_official);
}

#[test]
fn apply_fields_rejects_unknown_detail_keys() {
    let dir = tempfile::tempdir().unwrap();
    let details = dir.path().join("bad.json");
    std::fs::write(&details, r#"{ "isFavorite": true }"#).unwrap();

    let result = apply_fields(
        &mut Record::new("jin", "Jin"),
        &RecordFields {
            details: Some(details),
            ..RecordFields::default()
        },
    );
    assert!(matches!(result, Err(CliError::InvalidDetails { .. })));
}

#[test]
fn apply_fields_without_input_changes_nothing() {
    let mut record = Record::new("jin", "Jin");
    assert!(!apply_fields(&mut record, &RecordFields::default()).unwrap());
    assert_eq!(record, Record::new("jin", "Jin"));
}

#[test]
fn record_lines_mark_favorites() {
    let mut favorite = Record::new("jin", "Jin Kazama");
    favorite.is_favorite = true;
    favorite.fighting_style = "Karate".to_string();
    let lines = format_record_lines(&[favorite.clone(), Record::new("nina", "Nina")]);

    assert!(lines[0].starts_with("* jin"));
    assert!(lines[0].contains("Karate"));
    assert!(lines[1].starts_with("  nina"));
    assert!(record_to_list_item(&favorite).is_favorite);
    assert!(format_record_detail(&favorite).contains("[favorite]"));
}

#[test]
fn sync_outcomes_map_to_messages() {
    assert!(sync_outcome_message(&SyncState::Success, 4)
        .unwrap()
        .contains("4 characters"));
    assert!(sync_outcome_message(&SyncState::Idle, 0)
        .unwrap()
        .contains("dojo auth"));
    assert!(matches!(
        sync_outcome_message(&SyncState::Failed("offline".to_string()), 0),
        Err(CliError::SyncFailed(reason)) if reason == "offline"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_cache_contents() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = workspace(dir.path());
    workspace
        .cache
        .upsert_many(&[Record::new("jin", "Jin"), Record::new("nina", "Nina")])
        .await
        .unwrap();
    workspace
        .cache
        .set_favorite(&RecordId::from("nina"), true)
        .await
        .unwrap();

    let report = build_status(&workspace).await.unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.favorites, 1);
    assert_eq!(report.last_synced_at, None);
    assert!(!report.auth_configured);

    let lines = format_status_lines(&report);
    assert!(lines.iter().any(|line| line.contains("2 (1 favorites)")));
    assert!(lines.iter().any(|line| line.contains("never")));
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_requires_cached_record() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = workspace(dir.path());
    workspace
        .cache
        .upsert_one(&Record::new("jin", "Jin"))
        .await
        .unwrap();

    run_favorite(&workspace, "jin", true).await.unwrap();
    assert!(workspace.cache.snapshot()[0].is_favorite);

    let missing = run_favorite(&workspace, "nina", true).await;
    assert!(matches!(missing, Err(CliError::RecordNotFound(id)) if id == "nina"));
}

#[tokio::test(flavor = "multi_thread")]
async fn mutations_need_a_remote_and_an_identity() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = workspace(dir.path());

    let identity = workspace.identity().unwrap();
    assert!(matches!(
        workspace.connect(identity),
        Err(CliError::RemoteNotConfigured)
    ));

    let caller = resolve_caller_id(&NoIdentity).await;
    assert!(matches!(caller, Err(CliError::Core(dojo_core::Error::Auth(_)))));
}

#[tokio::test(flavor = "multi_thread")]
async fn signed_out_delete_is_rejected_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut workspace = workspace(dir.path());
    workspace.config.api_base_url = Some("http://127.0.0.1:9".to_string());
    let mut jin = Record::new("jin", "Jin");
    jin.created_by = "u1".to_string();
    workspace.cache.upsert_one(&jin).await.unwrap();

    assert_eq!(existing_caller_id(&NoIdentity).await, "");
    let result = run_delete(&workspace, "jin", false).await;
    assert!(matches!(
        result,
        Err(CliError::Core(dojo_core::Error::Ownership { .. }))
    ));
    assert_eq!(workspace.cache.snapshot().len(), 1);
}
