use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not enough space on destination: {required} bytes required, {available} bytes available")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("Failed to query free space for '{path}': {cause}")]
    FreeSpace { path: PathBuf, cause: io::Error },

    #[error("Failed to create directory '{path}': {cause}")]
    CreateDirectory { path: PathBuf, cause: io::Error },

    #[error("Failed to copy file from '{from}' to '{to}': {cause}")]
    FileCopy {
        from: PathBuf,
        to: PathBuf,
        cause: io::Error,
    },

    #[error("Failed to preserve modification time on '{path}': {cause}")]
    PreserveTimes { path: PathBuf, cause: io::Error },

    #[error("Failed to open log file '{path}': {cause}")]
    LogFile { path: PathBuf, cause: io::Error },

    #[error("Failed to install logger: {0}")]
    LoggerInit(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
