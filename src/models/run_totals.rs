use crate::models::candidate_file::CandidateFile;

/// Aggregate of the accounting pass across every job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub file_count: u64,
    pub backup_size: u64,
}

impl RunTotals {
    pub fn add(&mut self, candidate: &CandidateFile) {
        self.file_count += 1;
        self.backup_size += candidate.size;
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// The copy pass may only start when the projected size is strictly below the free space.
    pub fn fits_in(&self, available_space: u64) -> bool {
        self.backup_size < available_space
    }
}
