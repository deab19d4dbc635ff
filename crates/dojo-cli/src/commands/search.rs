use crate::commands::common::{
    format_record_lines, normalize_search_query, record_to_list_item, RecordListItem, Workspace,
};
use crate::error::CliError;

pub async fn run_search(
    workspace: &Workspace,
    query: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let mut records = workspace.cache.search_by_text(&normalized_query).await?;
    records.truncate(limit);

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
