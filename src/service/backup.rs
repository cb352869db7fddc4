use crate::models::backup_job::BackupJob;
use crate::models::candidate_file::CandidateFile;
use crate::models::copy_report::CopyReport;
use crate::models::error::{BackupError, Result};
use crate::models::run_totals::RunTotals;
use crate::service::scanner::Scanner;
use crate::utils::filesystem::Filesystem;
use crate::utils::logger::BackupLog;
use crate::utils::progress::format_bytes;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Result of comparing the accounting totals with the destination's free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    NothingToDo,
    Proceed { available_space: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToDo,
    Completed(CopyReport),
}

/// Drives a run over every job: an accounting pass, a free space check,
/// then a copy pass that re-scans each source.
pub struct BackupExecutor<'a, F: Filesystem + ?Sized, L: BackupLog + ?Sized> {
    jobs: Vec<BackupJob>,
    destination_root: PathBuf,
    fs: &'a F,
    log: &'a L,
}

impl<'a, F: Filesystem + ?Sized, L: BackupLog + ?Sized> BackupExecutor<'a, F, L> {
    /// Every job must write below `destination_root`, the path free space is measured on.
    pub fn new(
        jobs: Vec<BackupJob>,
        destination_root: impl Into<PathBuf>,
        fs: &'a F,
        log: &'a L,
    ) -> Result<Self> {
        let destination_root = destination_root.into();
        if let Some(job) = jobs
            .iter()
            .find(|job| job.destination_root() != destination_root)
        {
            return Err(BackupError::InvalidConfig(format!(
                "Backup source {} targets {} instead of the backup destination {}",
                job.source_root().display(),
                job.destination_root().display(),
                destination_root.display()
            )));
        }

        Ok(BackupExecutor {
            jobs,
            destination_root,
            fs,
            log,
        })
    }

    pub fn jobs(&self) -> &[BackupJob] {
        &self.jobs
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn run(&self, progress: Option<&ProgressBar>) -> Result<RunOutcome> {
        self.log.info("Starting backup...");

        let totals = self.account();
        match self.preflight(&totals)? {
            Preflight::NothingToDo => Ok(RunOutcome::NothingToDo),
            Preflight::Proceed { .. } => {
                if let Some(pb) = progress {
                    pb.set_length(totals.backup_size);
                }
                Ok(RunOutcome::Completed(self.copy(progress)))
            }
        }
    }

    /// Counts and sizes every stale file across all jobs without writing anything.
    pub fn account(&self) -> RunTotals {
        self.tally(|_| {})
    }

    /// Like [`account`](Self::account), but also names every file a copy pass would take.
    pub fn preview(&self) -> RunTotals {
        self.tally(|candidate| {
            self.log.info(&format!(
                "Would back up: {} -> {}",
                candidate.source_path.display(),
                candidate.destination_path.display()
            ))
        })
    }

    fn tally(&self, mut on_candidate: impl FnMut(&CandidateFile)) -> RunTotals {
        let mut totals = RunTotals::default();
        let mut unreadable = 0;
        for job in &self.jobs {
            let mut candidates = Scanner::new(job, self.fs).candidates();
            for candidate in candidates.by_ref() {
                on_candidate(&candidate);
                totals.add(&candidate);
            }
            unreadable += candidates.unreadable_entries();
        }

        if unreadable > 0 {
            self.log.error(&format!(
                "{} directories could not be read and were left out",
                unreadable
            ));
        }
        self.log.info(&format!(
            "Found {} files to back up ({} bytes, {})",
            totals.file_count,
            totals.backup_size,
            format_bytes(totals.backup_size)
        ));
        totals
    }

    /// Decides whether the copy pass may start. Equal size and free space is not enough.
    pub fn preflight(&self, totals: &RunTotals) -> Result<Preflight> {
        if totals.is_empty() {
            self.log.info("Nothing to back up, all files are up to date");
            return Ok(Preflight::NothingToDo);
        }

        let available_space = self.fs.disk_free_bytes(&self.destination_root)?;
        self.log.info(&format!(
            "Available space on {}: {} bytes ({})",
            self.destination_root.display(),
            available_space,
            format_bytes(available_space)
        ));

        if !totals.fits_in(available_space) {
            let error = BackupError::InsufficientSpace {
                required: totals.backup_size,
                available: available_space,
            };
            self.log.error(&format!("Aborting backup: {}", error));
            return Err(error);
        }

        Ok(Preflight::Proceed { available_space })
    }

    /// Copies every file that is stale right now. A failing file is logged and skipped.
    pub fn copy(&self, progress: Option<&ProgressBar>) -> CopyReport {
        let mut report = CopyReport::default();

        for job in &self.jobs {
            for candidate in &Scanner::new(job, self.fs) {
                if let Some(pb) = progress {
                    pb.set_message(candidate.source_path.display().to_string());
                }

                match self.back_up(&candidate) {
                    Ok(bytes) => {
                        report.copied += 1;
                        report.bytes_copied += bytes;
                        self.log
                            .info(&format!("Backed up: {}", candidate.source_path.display()));
                    }
                    Err(e) => {
                        report.failed += 1;
                        self.log.error(&format!(
                            "Failed to back up {}: {}",
                            candidate.source_path.display(),
                            e
                        ));
                    }
                }

                if let Some(pb) = progress {
                    pb.inc(candidate.size);
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let summary = format!(
            "Backup finished: {} files copied ({}), {} failed",
            report.copied,
            format_bytes(report.bytes_copied),
            report.failed
        );
        if report.has_failures() {
            self.log.error(&summary);
        } else {
            self.log.info(&summary);
        }
        report
    }

    fn back_up(&self, candidate: &CandidateFile) -> Result<u64> {
        if let Some(parent) = candidate.destination_path.parent() {
            self.fs.make_directories(parent)?;
        }
        self.fs
            .copy_file_preserving_metadata(&candidate.source_path, &candidate.destination_path)
    }
}
