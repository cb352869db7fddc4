use crate::models::error::{BackupError, Result};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// The parts of `stat` the backup needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_regular_file: bool,
    pub modified: SystemTime,
    pub size: u64,
}

/// Filesystem operations used by the scanner and the executor.
pub trait Filesystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn disk_free_bytes(&self, path: &Path) -> Result<u64>;

    /// Copies `from` to `to` and carries the source's timestamps onto the copy.
    fn copy_file_preserving_metadata(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Creates `path` and all missing parents; an existing directory is not an error.
    fn make_directories(&self, path: &Path) -> Result<()>;
}

/// The real filesystem of the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFilesystem;

impl Filesystem for HostFilesystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path)?;
        Ok(FileStat {
            is_regular_file: metadata.is_file(),
            modified: metadata.modified()?,
            size: metadata.len(),
        })
    }

    fn disk_free_bytes(&self, path: &Path) -> Result<u64> {
        let existing = nearest_existing_ancestor(path);
        fs2::available_space(existing).map_err(|cause| BackupError::FreeSpace {
            path: path.to_path_buf(),
            cause,
        })
    }

    fn copy_file_preserving_metadata(&self, from: &Path, to: &Path) -> Result<u64> {
        let bytes = fs::copy(from, to).map_err(|cause| BackupError::FileCopy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            cause,
        })?;

        let metadata = fs::metadata(from).map_err(|cause| BackupError::PreserveTimes {
            path: to.to_path_buf(),
            cause,
        })?;
        let accessed = FileTime::from_last_access_time(&metadata);
        let modified = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_times(to, accessed, modified).map_err(|cause| {
            BackupError::PreserveTimes {
                path: to.to_path_buf(),
                cause,
            }
        })?;

        Ok(bytes)
    }

    fn make_directories(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|cause| BackupError::CreateDirectory {
            path: path.to_path_buf(),
            cause,
        })
    }
}

/// The destination may not exist before the first copy; free space is read from
/// the closest directory that does.
fn nearest_existing_ancestor(path: &Path) -> &Path {
    path.ancestors()
        .find(|ancestor| !ancestor.as_os_str().is_empty() && ancestor.exists())
        .unwrap_or(path)
}
