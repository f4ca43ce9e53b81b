//! postsync CLI - offline-first posts from the terminal
//!
//! Every change lands locally first; `postsync sync` replays whatever the
//! remote store has not confirmed yet.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{load_client_config, open_engine, resolve_db_path, AppContext};
use crate::commands::completions::run_completions;
use crate::commands::dashboard::run_dashboard;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::sync::run_sync;
use crate::commands::track::run_track;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "postsync=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = AppContext {
        db_path: resolve_db_path(cli.db_path),
        config: load_client_config(cli.config.as_deref())?,
        offline: cli.offline,
    };
    let engine = open_engine(&context).await?;

    match cli.command {
        Commands::Add { title, body } => {
            run_add(&engine, &title, body).await?;
        }
        Commands::List { page, size, json } => {
            run_list(&engine, page, size, json).await?;
        }
        Commands::Edit { id, title, body } => {
            run_edit(&engine, &id, title, body).await?;
        }
        Commands::Delete { id } => {
            run_delete(&engine, &id).await?;
        }
        Commands::Sync => {
            run_sync(&engine).await?;
        }
        Commands::Dashboard { json } => {
            run_dashboard(&engine, json).await?;
        }
        Commands::Track { server_id } => {
            run_track(&engine, server_id).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
