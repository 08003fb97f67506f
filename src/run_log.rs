//! Per-run collection log.
//!
//! Every run gets a fresh `<unix-ts>-collection_log.log` file. Lines are
//! timestamped, appended and flushed immediately so the file stays useful
//! when the process is killed.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Timestamp format used at the start of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the run log started at `started_at` (unix seconds).
pub fn log_file_name(started_at: i64) -> String {
    format!("{started_at}-collection_log.log")
}

/// Formats one log line, without the trailing newline.
pub fn format_line(at: DateTime<Local>, message: &str) -> String {
    format!("{} - {}", at.format(TIMESTAMP_FORMAT), message)
}

#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Creates `dir` if needed and opens a new log file inside it.
    pub fn create(dir: &Path, started_at: i64) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

        let path = dir.join(log_file_name(started_at));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create run log {}", path.display()))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a timestamped line and flushes it to disk.
    pub fn append(&mut self, message: &str) -> Result<()> {
        self.append_at(Local::now(), message)
    }

    pub fn append_at(&mut self, at: DateTime<Local>, message: &str) -> Result<()> {
        writeln!(self.file, "{}", format_line(at, message))
            .and_then(|()| self.file.flush())
            .with_context(|| format!("Failed to write run log {}", self.path.display()))
    }
}

/// `log` backend writing to the run log and echoing to the terminal.
///
/// Warnings and errors are echoed to stderr, everything else to stdout.
#[derive(Debug)]
pub struct RunLogger {
    run_log: Mutex<RunLog>,
    echo: bool,
}

impl RunLogger {
    pub fn new(run_log: RunLog) -> Self {
        Self {
            run_log: Mutex::new(run_log),
            echo: true,
        }
    }

    // A panic while holding the lock leaves the file usable.
    fn run_log(&self) -> MutexGuard<'_, RunLog> {
        self.run_log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keeps records out of the terminal.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = Local::now();
        let message = record.args().to_string();

        if let Err(e) = self.run_log().append_at(now, &message) {
            eprintln!("{e:#}");
        }

        if self.echo {
            let line = format_line(now, &message);
            if record.level() <= Level::Warn {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    }

    fn flush(&self) {
        let mut run_log = self.run_log();
        if let Err(e) = run_log.file.flush() {
            eprintln!("Failed to flush run log {}: {e}", run_log.path.display());
        }
    }
}

/// Installs [`RunLogger`] as the global logger.
pub fn init_log(run_log: RunLog) -> Result<()> {
    log::set_boxed_logger(Box::new(RunLogger::new(run_log)))
        .map(|()| log::set_max_level(LevelFilter::Info))
        .map_err(|e| anyhow!("{e}"))
}

/// Whether [`init_log`] has already run.
pub fn is_initialized() -> bool {
    log::max_level() != LevelFilter::Off
}
