/// Outcome of the copy pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: u64,
    pub failed: u64,
    pub bytes_copied: u64,
}

impl CopyReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
