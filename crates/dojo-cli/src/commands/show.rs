use crate::commands::common::{format_record_detail, normalize_record_id, Workspace};
use crate::error::CliError;

pub async fn run_show(workspace: &Workspace, id: &str, as_json: bool) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let record = workspace
        .cache
        .get(&id)
        .await?
        .ok_or_else(|| CliError::RecordNotFound(id.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", format_record_detail(&record));
    }
    Ok(())
}
