use crate::cli::RecordFields;
use crate::commands::common::{apply_fields, existing_caller_id, normalize_record_id, Workspace};
use crate::error::CliError;

/// Partial update of a cached character. Unset fields keep their cached value.
pub async fn run_update(
    workspace: &Workspace,
    id: &str,
    name: Option<&str>,
    fields: &RecordFields,
    as_admin: bool,
) -> Result<(), CliError> {
    let id = normalize_record_id(id)?;
    let mut record = workspace
        .cache
        .get(&id)
        .await?
        .ok_or_else(|| CliError::RecordNotFound(id.to_string()))?;

    let mut changed = apply_fields(&mut record, fields)?;
    if let Some(name) = name {
        record.name = name.trim().to_string();
        changed = true;
    }
    if !changed {
        return Err(CliError::NothingToUpdate);
    }

    let identity = workspace.identity()?;
    let service = workspace.connect(identity.clone())?;
    let caller_id = existing_caller_id(identity.as_ref()).await;
    let updated = service.update(record, &caller_id, as_admin).await?;
    println!("{} (version {})", updated.id, updated.version);
    Ok(())
}
