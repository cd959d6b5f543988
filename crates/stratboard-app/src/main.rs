//! StratBoard command-line shell.
//!
//! Manages projects and edits their whiteboards from the terminal, against
//! either local files (guest mode) or a StratBoard server (cloud mode).

mod board;
mod config;
mod export;
mod frameworks;
mod parse;
mod projects;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use stratboard_core::storage::{FileStorage, RemoteStorage};
use stratboard_core::{Persistence, Storage, StorageMode};

#[derive(Parser, Debug)]
#[command(name = "stratboard", version, about = "Strategic-analysis whiteboards")]
struct Args {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct Options {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more detail
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the framework catalog
    #[command(subcommand)]
    Frameworks(frameworks::FrameworksCommand),

    /// Manage projects
    #[command(subcommand)]
    Projects(projects::ProjectsCommand),

    /// Apply one change to a project's board
    Board {
        /// Project id
        project: String,
        #[command(subcommand)]
        op: board::BoardOp,
    },

    /// Edit a project's board interactively
    Shell {
        /// Project id
        project: String,
    },

    /// Export a board as PNG and/or a Markdown outline
    Export(export::ExportArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn run_with<S: Storage>(storage: S, command: &Commands, config: &AppConfig) -> Result<()> {
    let persistence = Persistence::new(Arc::new(storage), config.storage_mode()?);
    match command {
        Commands::Frameworks(cmd) => frameworks::run(cmd),
        Commands::Projects(cmd) => projects::run(&persistence, cmd).await,
        Commands::Board { project, op } => board::run_once(persistence, project, op, config).await,
        Commands::Shell { project } => board::shell(persistence, project, config).await,
        Commands::Export(args) => export::run(persistence, args, config).await,
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(args.options.config.as_deref())?;

    // The catalog needs no storage.
    if let Commands::Frameworks(cmd) = &args.command {
        return frameworks::run(cmd);
    }

    match config.storage_mode()? {
        StorageMode::Guest => {
            let dir = config.data_dir()?;
            log::debug!("Using local boards in {}", dir.display());
            let storage = FileStorage::new(dir).context("opening local board storage")?;
            run_with(storage, &args.command, &config).await
        }
        StorageMode::Cloud { user_id } => {
            log::debug!("Using remote boards at {}", config.remote.endpoint);
            let mut storage = RemoteStorage::new(&config.remote.endpoint, user_id)
                .context("configuring the remote board store")?;
            if let Some(key) = &config.remote.api_key {
                storage = storage.with_api_key(key.clone());
            }
            run_with(storage, &args.command, &config).await
        }
    }
}

fn handle_result(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.options.verbose);
    handle_result(run(args).await);
}
