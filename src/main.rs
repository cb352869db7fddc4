mod models;
mod service;
mod utils;

use crate::models::config::{setup_config, Config};
use crate::models::error::BackupError;
use crate::service::backup::{BackupExecutor, Preflight, RunOutcome};
use crate::utils::filesystem::HostFilesystem;
use crate::utils::logger::{init_logging, parse_level, LogFacade};
use crate::utils::progress::create_copy_progress_bar;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::{debug, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "RustyMirrorBackup")]
#[command(about = "Incremental mirror backup utility", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.json",
        env = "RUSTYMIRRORBACKUP_CONFIG"
    )]
    config_file: String,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    /// Also write the log to this file (truncated on start)
    #[arg(short = 'L', long = "log-file", env = "RUSTYMIRRORBACKUP_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,

    /// Count and size what would be copied, then stop
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_logging(parse_level(&args.log_level), args.log_file.as_deref())
        .context("Failed to initialize logging")?;

    info!("RustyMirrorBackup starting...");
    let config: Config =
        setup_config(args.config_file.clone()).context("Failed to load configuration")?;
    debug!("Loaded config: {:?}", &config);

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    let jobs = config.backup_jobs().context("Failed to build backup jobs")?;
    let filesystem = HostFilesystem;
    let log = LogFacade;
    let executor = BackupExecutor::new(jobs, config.destination_root(), &filesystem, &log)
        .context("Failed to set up backup")?;

    info!(
        "Backing up {} sources into {} (staleness interval {}s)",
        executor.jobs().len(),
        executor.destination_root().display(),
        config.staleness_interval_secs
    );

    if args.dry_run {
        return dry_run(&executor);
    }

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        create_copy_progress_bar("Copying files")
    };

    match executor.run(Some(&progress)) {
        // Per-file failures are already summarized by the copy pass
        Ok(RunOutcome::NothingToDo | RunOutcome::Completed(_)) => Ok(()),
        Err(e @ BackupError::InsufficientSpace { .. }) => {
            Err(e).context("Backup aborted before copying any file")
        }
        Err(e) => Err(e).context("Backup operation failed"),
    }
}

fn dry_run(executor: &BackupExecutor<'_, HostFilesystem, LogFacade>) -> Result<()> {
    info!("Running in DRY RUN mode - no files will be copied");
    let totals = executor.preview();
    match executor
        .preflight(&totals)
        .context("Backup would not fit on the destination")?
    {
        Preflight::NothingToDo => {}
        Preflight::Proceed { available_space } => info!(
            "DRY RUN completed - {} files ({} bytes) would be copied, {} bytes would remain free",
            totals.file_count,
            totals.backup_size,
            available_space - totals.backup_size
        ),
    }
    Ok(())
}
