use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dojo")]
#[command(about = "Browse and edit the fighting-game roster from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local cache database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List cached characters
    #[command(alias = "ls")]
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        /// Number of characters to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one character
    Show {
        /// Character ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search cached characters
    Search {
        /// Search query (case-insensitive)
        query: String,
        /// Number of characters to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark or unmark a character as favorite (local only)
    #[command(alias = "fav")]
    Favorite {
        /// Character ID
        id: String,
        /// Remove the favorite mark instead
        #[arg(long)]
        off: bool,
    },
    /// Create a new character
    #[command(alias = "new")]
    Create {
        /// Character name
        name: String,
        #[command(flatten)]
        fields: RecordFields,
    },
    /// Update a character you created
    #[command(alias = "edit")]
    Update {
        /// Character ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RecordFields,
        /// Act with admin rights
        #[arg(long)]
        admin: bool,
    },
    /// Delete a character you created
    Delete {
        /// Character ID
        id: String,
        /// Act with admin rights
        #[arg(long)]
        admin: bool,
    },
    /// Pull the remote roster into the local cache
    Sync {
        /// Keep running and sync again every N seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },
    /// Show cache and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the Supabase session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

/// Optional character fields shared by `create` and `update`.
#[derive(Args, Debug, Default, Clone)]
pub struct RecordFields {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_name = "STYLE")]
    pub fighting_style: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub difficulty: Option<String>,
    #[arg(long, value_name = "URL")]
    pub image_url: Option<String>,
    /// JSON file with move list, combos, frame data, stats or translations
    #[arg(long, value_name = "PATH")]
    pub details: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with Supabase email/password and store the session in the keychain
    Login {
        /// Supabase account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Supabase account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an anonymous identity if none is stored
    Anonymous,
    /// Show the stored session
    Status,
    /// Sign out and clear the stored session
    Logout,
}
