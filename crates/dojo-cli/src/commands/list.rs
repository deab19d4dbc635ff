use crate::commands::common::{
    format_record_lines, record_to_list_item, RecordListItem, Workspace,
};
use crate::error::CliError;

pub fn run_list(
    workspace: &Workspace,
    favorites_only: bool,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let snapshot = workspace.cache.snapshot();
    let records = snapshot
        .iter()
        .filter(|record| !favorites_only || record.is_favorite)
        .take(limit)
        .cloned()
        .collect::<Vec<_>>();

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("No characters cached yet. Run `dojo sync` to fetch the roster.");
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
