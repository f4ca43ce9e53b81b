use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "postsync")]
#[command(about = "Offline-first posts from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional JSON client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat the remote store as unreachable; mutations are queued
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new post
    #[command(alias = "new")]
    Add {
        /// Post title
        title: Vec<String>,
        /// Post body (read from piped stdin when omitted)
        #[arg(short, long)]
        body: Option<String>,
    },
    /// List local posts merged with a remote page
    List {
        /// Zero-based remote page
        #[arg(short, long, default_value = "0")]
        page: usize,
        /// Remote page size (configured default when omitted)
        #[arg(short, long)]
        size: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing post
    Edit {
        /// Post ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body (opens $EDITOR when neither flag is given)
        #[arg(long)]
        body: Option<String>,
    },
    /// Delete an existing post
    Delete {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// Replay queued changes against the remote store
    Sync,
    /// Show sync counters and the most recent posts
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start tracking a remote post locally
    Track {
        /// Remote server id
        server_id: i64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
