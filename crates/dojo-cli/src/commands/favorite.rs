use crate::commands::common::{normalize_record_id, Workspace};
use crate::error::CliError;

pub async fn run_favorite(workspace: &Workspace, id: &str, is_favorite: bool) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    if !workspace.cache.set_favorite(&id, is_favorite).await? {
        return Err(CliError::RecordNotFound(id.to_string()));
    }

    let label = if is_favorite { "Favorited" } else { "Unfavorited" };
    println!("{label} {id}");
    Ok(())
}
