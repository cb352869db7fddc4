use crate::models::backup_job::BackupJob;
use crate::models::candidate_file::CandidateFile;
use crate::utils::directory::{destination_path_for, walk_source_tree};
use crate::utils::filesystem::Filesystem;
use log::warn;
use std::time::{Duration, SystemTime};

/// Finds the files of one job that need backing up.
///
/// Scanning only reads the filesystem. Every call to [`Scanner::candidates`]
/// starts a fresh walk, so the destination state is re-read each time.
pub struct Scanner<'a, F: Filesystem + ?Sized> {
    job: &'a BackupJob,
    fs: &'a F,
}

impl<'a, F: Filesystem + ?Sized> Scanner<'a, F> {
    pub fn new(job: &'a BackupJob, fs: &'a F) -> Self {
        Scanner { job, fs }
    }

    pub fn candidates(&self) -> Candidates<'a, F> {
        Candidates {
            job: self.job,
            fs: self.fs,
            walk: walk_source_tree(self.job.source_root()),
            unreadable: 0,
        }
    }
}

impl<'a, F: Filesystem + ?Sized> IntoIterator for &Scanner<'a, F> {
    type Item = CandidateFile;
    type IntoIter = Candidates<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates()
    }
}

/// Lazy sequence of stale files produced by one walk of a source tree.
pub struct Candidates<'a, F: Filesystem + ?Sized> {
    job: &'a BackupJob,
    fs: &'a F,
    walk: walkdir::IntoIter,
    unreadable: u64,
}

impl<F: Filesystem + ?Sized> Iterator for Candidates<'_, F> {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<CandidateFile> {
        // A missing or unreadable source root shows up as a depth 0 walk error and yields nothing
        while let Some(entry) = self.walk.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if e.depth() > 0 {
                        self.unreadable += 1;
                        warn!(
                            "Skipping unreadable entry below {}: {}",
                            self.job.source_root().display(),
                            e
                        );
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(candidate) = self.evaluate(entry.path()) {
                return Some(candidate);
            }
        }
        None
    }
}

impl<F: Filesystem + ?Sized> Candidates<'_, F> {
    /// Directories below the source root that could not be read so far in this walk.
    pub fn unreadable_entries(&self) -> u64 {
        self.unreadable
    }

    fn evaluate(&self, source_path: &std::path::Path) -> Option<CandidateFile> {
        let destination_path = destination_path_for(
            self.job.source_root(),
            self.job.namespace(),
            self.job.destination_root(),
            source_path,
        )?;

        // Listed but gone by now: the copy attempt reports it
        let source = match self.fs.stat(source_path) {
            Ok(source) => source,
            Err(_) => {
                return Some(CandidateFile {
                    source_path: source_path.to_path_buf(),
                    destination_path,
                    size: 0,
                })
            }
        };
        if !source.is_regular_file {
            return None;
        }

        // Missing or unreadable backup: copy it and let the copy report any problem
        let destination_modified = self
            .fs
            .stat(&destination_path)
            .ok()
            .map(|destination| destination.modified);

        if !is_stale(source.modified, destination_modified, self.job.staleness_interval()) {
            return None;
        }

        Some(CandidateFile {
            source_path: source_path.to_path_buf(),
            destination_path,
            size: source.size,
        })
    }
}

/// A file needs backing up when it has no backup yet, or when the source is
/// newer than the backup by at least `interval`.
///
/// A backup newer than its source is never stale.
pub fn is_stale(
    source_modified: SystemTime,
    destination_modified: Option<SystemTime>,
    interval: Duration,
) -> bool {
    match destination_modified {
        None => true,
        Some(destination_modified) => match source_modified.duration_since(destination_modified) {
            Ok(age) => age >= interval,
            Err(_) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::filesystem::HostFilesystem;
    use filetime::FileTime;
    use std::collections::HashSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn write_file(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn set_mtime(path: &Path, unix_seconds: i64) {
        filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0)).unwrap();
    }

    fn sources(candidates: impl Iterator<Item = CandidateFile>) -> HashSet<PathBuf> {
        candidates.map(|c| c.source_path).collect()
    }

    struct Fixture {
        _source_dir: TempDir,
        _dest_dir: TempDir,
        source_root: PathBuf,
        destination_root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let source_dir = TempDir::new().unwrap();
            let dest_dir = TempDir::new().unwrap();
            let source_root = source_dir.path().join("docs");
            fs::create_dir(&source_root).unwrap();
            let destination_root = dest_dir.path().to_path_buf();
            Fixture {
                _source_dir: source_dir,
                _dest_dir: dest_dir,
                source_root,
                destination_root,
            }
        }

        fn job(&self, interval: Duration) -> BackupJob {
            BackupJob::new(&self.source_root, &self.destination_root, interval).unwrap()
        }

        fn backup_of(&self, relative: &str) -> PathBuf {
            self.destination_root.join("docs").join(relative)
        }
    }

    #[test]
    fn test_is_stale_without_destination() {
        let now = SystemTime::now();
        assert!(is_stale(now, None, Duration::from_secs(u64::MAX / 4)));
    }

    #[test]
    fn test_is_stale_boundary_is_inclusive() {
        let destination = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let interval = 6 * HOUR;

        assert!(is_stale(destination + interval, Some(destination), interval));
        assert!(!is_stale(
            destination + interval - Duration::from_secs(1),
            Some(destination),
            interval
        ));
    }

    #[test]
    fn test_is_stale_ignores_newer_destination() {
        let source = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let destination = source + HOUR;
        assert!(!is_stale(source, Some(destination), Duration::ZERO));
        assert!(is_stale(source, Some(source), Duration::ZERO));
    }

    #[test]
    fn test_maps_nested_files_under_source_basename() {
        let fixture = Fixture::new();
        write_file(&fixture.source_root.join("x").join("y.txt"), b"hello");
        let job = fixture.job(HOUR);

        let candidates: Vec<CandidateFile> = Scanner::new(&job, &HostFilesystem).candidates().collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source_path, fixture.source_root.join("x").join("y.txt"));
        assert_eq!(candidates[0].destination_path, fixture.backup_of("x/y.txt"));
        assert_eq!(candidates[0].size, 5);
    }

    #[test]
    fn test_missing_source_root_yields_nothing() {
        let fixture = Fixture::new();
        let job = BackupJob::new(
            fixture.source_root.join("does_not_exist"),
            &fixture.destination_root,
            HOUR,
        )
        .unwrap();

        let mut candidates = Scanner::new(&job, &HostFilesystem).candidates();
        assert_eq!(candidates.by_ref().count(), 0);
        assert_eq!(candidates.unreadable_entries(), 0);
    }

    #[test]
    fn test_subdirectory_lost_mid_walk_is_counted() {
        let fixture = Fixture::new();
        write_file(&fixture.source_root.join("a.txt"), b"a");
        write_file(&fixture.source_root.join("sub").join("b.txt"), b"b");
        let job = fixture.job(HOUR);
        let mut candidates = Scanner::new(&job, &HostFilesystem).candidates();

        let first = candidates.next().unwrap();
        assert_eq!(first.source_path, fixture.source_root.join("a.txt"));

        // Listed with the root, removed before the walk descends into it
        fs::remove_dir_all(fixture.source_root.join("sub")).unwrap();

        assert!(candidates.next().is_none());
        assert_eq!(candidates.unreadable_entries(), 1);
    }

    #[test]
    fn test_directories_are_not_candidates() {
        let fixture = Fixture::new();
        fs::create_dir_all(fixture.source_root.join("empty").join("nested")).unwrap();
        write_file(&fixture.source_root.join("a.txt"), b"a");
        let job = fixture.job(HOUR);

        let found = sources(Scanner::new(&job, &HostFilesystem).candidates());

        assert_eq!(found, HashSet::from([fixture.source_root.join("a.txt")]));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_candidates() {
        let fixture = Fixture::new();
        let target = fixture.source_root.join("real.txt");
        write_file(&target, b"real");
        std::os::unix::fs::symlink(&target, fixture.source_root.join("link.txt")).unwrap();
        let job = fixture.job(HOUR);

        let found = sources(Scanner::new(&job, &HostFilesystem).candidates());

        assert_eq!(found, HashSet::from([target]));
    }

    #[test]
    fn test_missing_destination_is_always_included() {
        let fixture = Fixture::new();
        write_file(&fixture.source_root.join("a.txt"), b"a");
        let job = fixture.job(Duration::from_secs(100 * 365 * 24 * 60 * 60));

        assert_eq!(Scanner::new(&job, &HostFilesystem).candidates().count(), 1);
    }

    #[test]
    fn test_staleness_boundary_on_disk() {
        let fixture = Fixture::new();
        let interval = 6 * HOUR;
        let source_mtime = 1_700_000_000;

        let exact = fixture.source_root.join("exact.txt");
        let recent = fixture.source_root.join("recent.txt");
        write_file(&exact, b"exact");
        write_file(&recent, b"recent");
        set_mtime(&exact, source_mtime);
        set_mtime(&recent, source_mtime);

        let exact_backup = fixture.backup_of("exact.txt");
        let recent_backup = fixture.backup_of("recent.txt");
        write_file(&exact_backup, b"old");
        write_file(&recent_backup, b"old");
        set_mtime(&exact_backup, source_mtime - interval.as_secs() as i64);
        set_mtime(&recent_backup, source_mtime - interval.as_secs() as i64 + 1);

        let job = fixture.job(interval);
        let found = sources(Scanner::new(&job, &HostFilesystem).candidates());

        assert_eq!(found, HashSet::from([exact]));
    }

    #[test]
    fn test_newer_backup_is_skipped() {
        let fixture = Fixture::new();
        let source = fixture.source_root.join("a.txt");
        let backup = fixture.backup_of("a.txt");
        write_file(&source, b"a");
        write_file(&backup, b"a");
        set_mtime(&source, 1_700_000_000);
        set_mtime(&backup, 1_800_000_000);
        let job = fixture.job(Duration::ZERO);

        assert_eq!(Scanner::new(&job, &HostFilesystem).candidates().count(), 0);
    }

    #[test]
    fn test_scan_is_restartable_and_has_no_side_effects() {
        let fixture = Fixture::new();
        write_file(&fixture.source_root.join("a.txt"), b"a");
        write_file(&fixture.source_root.join("sub").join("b.txt"), b"bb");
        let job = fixture.job(HOUR);
        let scanner = Scanner::new(&job, &HostFilesystem);

        let first = sources(scanner.candidates());
        let second = sources((&scanner).into_iter());

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert!(!fixture.destination_root.join("docs").exists());
    }

    #[test]
    fn test_rescan_sees_destination_changes() {
        let fixture = Fixture::new();
        let source = fixture.source_root.join("a.txt");
        write_file(&source, b"a");
        let job = fixture.job(HOUR);
        let scanner = Scanner::new(&job, &HostFilesystem);

        assert_eq!(scanner.candidates().count(), 1);

        let backup = fixture.backup_of("a.txt");
        write_file(&backup, b"a");
        let source_mtime = FileTime::from_last_modification_time(&fs::metadata(&source).unwrap());
        filetime::set_file_mtime(&backup, source_mtime).unwrap();

        assert_eq!(scanner.candidates().count(), 0);
    }
}
