//! scdata CLI - inspect and maintain the local map data store
//!
//! Works entirely offline on the same database the app uses: pending note
//! edits, downloaded notes and element geometry.

mod cli;
mod commands;
mod error;


use clap::Parser;
use scdata_core::config::DataConfig;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::common::{default_config_path, resolve_db_path, AppContext};
use crate::commands::config::run_config;
use crate::commands::edits::run_edits;
use crate::commands::geometry::run_geometry;
use crate::commands::notes::run_notes;
use crate::commands::user::run_user;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "scdata=info";

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = DataConfig::load_from_path(&config_path)?;

    init_tracing(config.log_filter.as_deref())?;

    let db_path = resolve_db_path(cli.db_path, &config)?;
    tracing::debug!(
        "Using config {} and database {}",
        config_path.display(),
        db_path.display()
    );

    if let Commands::Config { command } = cli.command {
        return run_config(command, &config_path, &db_path);
    }

    let ctx = AppContext::open(&db_path, config)?;
    match cli.command {
        Commands::Edits { command } => run_edits(command, &ctx)?,
        Commands::Notes { command } => run_notes(command, &ctx)?,
        Commands::Geometry { command } => run_geometry(command, &ctx)?,
        Commands::User { command } => run_user(command, &ctx)?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(log_filter: Option<&str>) -> Result<(), CliError> {
    let directive = log_filter
        .unwrap_or(DEFAULT_LOG_DIRECTIVE)
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("Invalid log filter: {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
