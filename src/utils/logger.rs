use crate::models::error::{BackupError, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Sink for the events a backup run reports.
pub trait BackupLog {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards backup events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl BackupLog for LogFacade {
    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Logger that writes every record to stdout and to a log file
pub struct TeeLogger {
    level: LevelFilter,
    file: Mutex<File>,
}

impl TeeLogger {
    /// Create a new TeeLogger, truncating the log file
    pub fn new(level: LevelFilter, path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|cause| BackupError::LogFile {
            path: path.to_path_buf(),
            cause,
        })?;
        Ok(TeeLogger {
            level,
            file: Mutex::new(file),
        })
    }

    fn format(record: &Record) -> String {
        format!(
            "[{}] {:<8} - {}",
            chrono::Local::now().format("%H:%M:%S"),
            level_name(record.level()),
            record.args()
        )
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::format(record);
        println!("{}", line);

        // Write failures are dropped
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

pub fn parse_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Install the process logger: stdout + `log_file` when given, `env_logger` otherwise.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let logger = TeeLogger::new(level, path)?;
            log::set_max_level(level);
            log::set_boxed_logger(Box::new(logger))
                .map_err(|e| BackupError::LoggerInit(e.to_string()))
        }
        None => {
            env_logger::Builder::from_default_env()
                .filter_level(level)
                .format_timestamp_secs()
                .init();
            Ok(())
        }
    }
}
