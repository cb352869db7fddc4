use crate::models::backup_job::BackupJob;
use crate::models::config_validator::validate_config;
use crate::models::error::{BackupError, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backup_sources: Vec<String>,
    pub backup_destination: String,
    #[serde(default = "default_staleness_interval_secs")]
    pub staleness_interval_secs: u64,
}

/// Six hours.
const fn default_staleness_interval_secs() -> u64 {
    6 * 60 * 60
}

impl Config {
    pub fn staleness_interval(&self) -> Duration {
        Duration::from_secs(self.staleness_interval_secs)
    }

    pub fn destination_root(&self) -> PathBuf {
        PathBuf::from(&self.backup_destination)
    }

    /// One job per source, in configuration order.
    pub fn backup_jobs(&self) -> Result<Vec<BackupJob>> {
        let interval = self.staleness_interval();
        self.backup_sources
            .iter()
            .map(|source| BackupJob::new(source, self.destination_root(), interval))
            .collect()
    }
}

pub fn setup_config(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        BackupError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    let config: Config = serde_json::from_str(&config_str).map_err(|cause| {
        BackupError::ConfigParse {
            path: config_path,
            cause,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}
