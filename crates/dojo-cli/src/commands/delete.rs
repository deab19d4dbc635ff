use crate::commands::common::{existing_caller_id, normalize_record_id, Workspace};
use crate::error::CliError;

pub async fn run_delete(workspace: &Workspace, id: &str, as_admin: bool) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let identity = workspace.identity()?;
    let service = workspace.connect(identity.clone())?;
    let caller_id = existing_caller_id(identity.as_ref()).await;

    service.delete(&id, &caller_id, as_admin).await?;
    println!("{id}");
    Ok(())
}
