use std::path::{Path, PathBuf};

use scdata_core::config::DataConfig;

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    config_path: &Path,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = DataConfig::load_from_path(config_path)?;
            println!("config file: {}", config_path.display());
            println!("database:    {}", db_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Init {
            database_path,
            retention_days,
            log_filter,
        } => {
            run_config_init(config_path, database_path, retention_days, log_filter)?;
            println!("Saved config to {}", config_path.display());
        }
    }
    Ok(())
}

pub fn run_config_init(
    config_path: &Path,
    database_path: Option<PathBuf>,
    retention_days: Option<u32>,
    log_filter: Option<String>,
) -> Result<DataConfig, CliError> {
    let mut config = DataConfig::load_from_path(config_path)?;

    if let Some(path) = database_path {
        config.database_path = Some(path);
    }
    if let Some(days) = retention_days {
        config.synced_edit_retention_days = days;
    }
    if let Some(filter) = log_filter {
        config.log_filter = Some(filter);
    }

    config.save_to_path(config_path)?;
    Ok(DataConfig::load_from_path(config_path)?)
}
