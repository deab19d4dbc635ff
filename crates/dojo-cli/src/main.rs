//! Dojo CLI - browse the fighting-game roster from the terminal
//!
//! Reads come from the local cache; `sync` pulls the shared roster and
//! mutations go to the remote store.

mod auth;
mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Workspace;
use crate::commands::create::run_create;
use crate::commands::delete::run_delete;
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::update::run_update;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "dojo=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let workspace = Workspace::open(cli.db_path)?;
    match cli.command {
        Commands::List {
            favorites,
            limit,
            json,
        } => run_list(&workspace, favorites, limit, json)?,
        Commands::Show { id, json } => run_show(&workspace, &id, json).await?,
        Commands::Search { query, limit, json } => {
            run_search(&workspace, &query, limit, json).await?;
        }
        Commands::Favorite { id, off } => run_favorite(&workspace, &id, !off).await?,
        Commands::Create { name, fields } => run_create(&workspace, &name, &fields).await?,
        Commands::Update {
            id,
            name,
            fields,
            admin,
        } => run_update(&workspace, &id, name.as_deref(), &fields, admin).await?,
        Commands::Delete { id, admin } => run_delete(&workspace, &id, admin).await?,
        Commands::Sync { every } => run_sync(&workspace, every).await?,
        Commands::Status { json } => run_status(&workspace, json).await?,
        Commands::Auth { command } => run_auth(command, &workspace.config).await?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVE)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
