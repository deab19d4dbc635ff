use dojo_core::auth::IdentityProvider;
use dojo_core::config::ClientConfig;

use crate::auth::identity_from_config;
use crate::cli::AuthCommands;
use crate::commands::common::format_sync_timestamp;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, config: &ClientConfig) -> Result<(), CliError> {
    let identity = identity_from_config(config)?.ok_or(CliError::AuthNotConfigured)?;

    match command {
        AuthCommands::Login { email, password } => {
            let session = identity.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
        }
        AuthCommands::Anonymous => {
            identity.create_anonymous_identity().await?;
            let user_id = identity
                .current_user_id()
                .await
                .ok_or(CliError::NotSignedIn)?;
            println!("Using identity {user_id}");
        }
        AuthCommands::Status => match identity.session().await? {
            Some(session) => {
                let label = if session.user.is_anonymous {
                    "anonymous".to_string()
                } else {
                    session
                        .user
                        .email
                        .clone()
                        .unwrap_or_else(|| "(no email)".to_string())
                };
                println!(
                    "Signed in as {} ({}), session expires {}",
                    label,
                    session.user.id,
                    format_sync_timestamp(session.expires_at.saturating_mul(1000))
                );
            }
            None => println!("Not signed in."),
        },
        AuthCommands::Logout => {
            identity.sign_out().await?;
            println!("Signed out");
        }
    }
    Ok(())
}
