use crate::models::error::{BackupError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One source tree mirrored into `destination_root/<source basename>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    source_root: PathBuf,
    destination_root: PathBuf,
    staleness_interval: Duration,
}

impl BackupJob {
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        staleness_interval: Duration,
    ) -> Result<Self> {
        let source_root = source_root.into();
        if source_root.file_name().is_none() {
            return Err(BackupError::InvalidConfig(format!(
                "Backup source has no final path component to use as its backup folder: {}",
                source_root.display()
            )));
        }

        Ok(BackupJob {
            source_root,
            destination_root: destination_root.into(),
            staleness_interval,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn staleness_interval(&self) -> Duration {
        self.staleness_interval
    }

    /// Name of the folder this job occupies under the destination root.
    pub fn namespace(&self) -> &OsStr {
        // Checked in `new`.
        self.source_root.file_name().unwrap_or_default()
    }
}
