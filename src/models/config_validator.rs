use crate::models::config::Config;
use crate::models::error::{BackupError, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_backup_sources(&config.backup_sources)?;

    validate_backup_destination(&config.backup_destination)?;

    check_namespace_collisions(&config.backup_sources);

    if config.staleness_interval_secs == 0 {
        warn!("staleness_interval_secs is 0 - every file whose backup is not newer than its source will be copied again");
    }

    info!("Configuration validation passed");
    Ok(())
}

/// Validate backup source directories
fn validate_backup_sources(sources: &[String]) -> Result<()> {
    if sources.is_empty() {
        return Err(BackupError::InvalidConfig(
            "At least one backup source must be configured".to_string(),
        ));
    }

    for (idx, source) in sources.iter().enumerate() {
        let path = Path::new(source);

        if !path.is_absolute() {
            return Err(BackupError::InvalidConfig(format!(
                "Backup source #{} must be an absolute path: {}",
                idx + 1,
                source
            )));
        }

        if path.file_name().is_none() {
            return Err(BackupError::InvalidConfig(format!(
                "Backup source #{} has no final path component to use as its backup folder: {}",
                idx + 1,
                source
            )));
        }

        // A missing source is scanned as an empty tree
        if !path.exists() {
            warn!(
                "Backup source #{} does not exist and will be skipped: {}",
                idx + 1,
                source
            );
            continue;
        }

        if !path.is_dir() {
            return Err(BackupError::InvalidConfig(format!(
                "Backup source #{} is not a directory: {}",
                idx + 1,
                source
            )));
        }
    }

    Ok(())
}

/// Validate the backup destination directory
fn validate_backup_destination(destination: &str) -> Result<()> {
    let path = Path::new(destination);

    if !path.is_absolute() {
        return Err(BackupError::InvalidConfig(format!(
            "Backup destination must be an absolute path: {}",
            destination
        )));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(BackupError::InvalidConfig(format!(
                "Backup destination exists but is not a directory: {}",
                destination
            )));
        }
        return Ok(());
    }

    match path.parent() {
        Some(parent) if parent.is_dir() => {
            warn!(
                "Backup destination does not exist but will be created: {}",
                destination
            );
            Ok(())
        }
        Some(parent) => {
            #[cfg(windows)]
            let suggestion = format!("mkdir \"{}\"", parent.display());
            #[cfg(not(windows))]
            let suggestion = format!("mkdir -p \"{}\"", parent.display());

            Err(BackupError::InvalidConfig(format!(
                "Backup destination parent directory does not exist: {}\nSuggestion: Create the parent directory with: {}",
                destination, suggestion
            )))
        }
        None => Err(BackupError::InvalidConfig(format!(
            "Backup destination has no parent directory: {}",
            destination
        ))),
    }
}

/// Sources sharing a basename are mirrored into the same destination folder
fn check_namespace_collisions(sources: &[String]) {
    let mut seen: HashMap<&std::ffi::OsStr, &str> = HashMap::new();
    for source in sources {
        let Some(name) = Path::new(source).file_name() else {
            continue;
        };
        if let Some(previous) = seen.insert(name, source) {
            warn!(
                "Backup sources '{}' and '{}' share the folder name '{}' and will be mirrored into the same destination folder",
                previous,
                source,
                name.to_string_lossy()
            );
        }
    }
}
