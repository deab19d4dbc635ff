use std::time::Duration;

use dojo_core::SyncState;

use crate::commands::common::Workspace;
use crate::error::CliError;

pub async fn run_sync(workspace: &Workspace, every_secs: Option<u64>) -> Result<(), CliError> {
    let service = workspace.connect(workspace.identity()?)?;

    let Some(every_secs) = every_secs else {
        let state = service.sync_now().await;
        println!("{}", sync_outcome_message(&state, workspace.cache.snapshot().len())?);
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = service.sync_now().await;
                match sync_outcome_message(&state, workspace.cache.snapshot().len()) {
                    Ok(message) => println!("{message}"),
                    Err(error) => eprintln!("{error}"),
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                println!("Stopped");
                return Ok(());
            }
        }
    }
}

pub fn sync_outcome_message(state: &SyncState, cached: usize) -> Result<String, CliError> {
    match state {
        SyncState::Success => Ok(format!("Sync completed ({cached} characters cached)")),
        SyncState::Failed(reason) => Err(CliError::SyncFailed(reason.clone())),
        SyncState::Running => Ok("A sync is already running".to_string()),
        SyncState::Idle => Ok(
            "Sync skipped: the remote store needs an identity. Run `dojo auth login` or `dojo auth anonymous`."
                .to_string(),
        ),
    }
}
