use std::path::PathBuf;

/// A source file that a scan decided needs backing up, paired with where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// Size of the source file when it was scanned.
    pub size: u64,
}
