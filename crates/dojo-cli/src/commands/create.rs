use dojo_core::Record;

use crate::cli::RecordFields;
use crate::commands::common::{apply_fields, resolve_caller_id, Workspace};
use crate::error::CliError;

pub async fn run_create(
    workspace: &Workspace,
    name: &str,
    fields: &RecordFields,
) -> Result<(), CliError> {
    let identity = workspace.identity()?;
    let service = workspace.connect(identity.clone())?;
    let caller_id = resolve_caller_id(identity.as_ref()).await?;

    let mut record = Record::new("", name.trim());
    apply_fields(&mut record, fields)?;

    let created = service.create(record, &caller_id).await?;
    println!("{}", created.id);
    Ok(())
}
