//! Dated log files with retention.
//!
//! Every progress line is appended to one file per calendar day. A sweep
//! deletes files older than the retention window; it runs once at startup
//! and then daily.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tubepilot_automation::LogLevel;

const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const FILE_PREFIX: &str = "tubepilot-";
const FILE_SUFFIX: &str = ".log";

/// Appends progress lines to dated files under one directory.
pub struct FileLogSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLogSink {
    /// Create the sink, ensuring the directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, now: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", now.format("%Y-%m-%d")))
    }

    fn format_line(
        now: DateTime<Utc>,
        session_id: Option<&str>,
        level: LogLevel,
        message: &str,
    ) -> String {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let level = level.as_str().to_uppercase();
        match session_id {
            Some(id) => format!("{timestamp} [{id}] [{level}] {message}"),
            None => format!("{timestamp} [{level}] {message}"),
        }
    }

    /// Append one line to today's file.
    ///
    /// Write failures are reported to the operator log and swallowed; the
    /// automation never fails because a disk write did.
    pub fn append(&self, session_id: Option<&str>, level: LogLevel, message: &str) {
        let now = Utc::now();
        let line = Self::format_line(now, session_id, level, message);
        let path = self.file_for(now);

        let _guard = self.write_lock.lock();
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to append log line");
        }
    }

    /// Delete log files past the retention window. Returns how many were
    /// removed.
    pub fn sweep_old_files(&self) -> usize {
        self.sweep_older_than(RETENTION)
    }

    fn sweep_older_than(&self, retention: Duration) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to read log directory");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(FILE_PREFIX) || !name.ends_with(FILE_SUFFIX) {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let expired = modified
                .elapsed()
                .map(|age| age > retention)
                .unwrap_or(false);
            if !expired {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = name, "deleted old log file");
                    removed += 1;
                }
                Err(e) => warn!(file = name, error = %e, "failed to delete old log file"),
            }
        }
        removed
    }
}

/// Run the retention sweep immediately and then once a day, until the
/// shutdown signal fires.
pub fn spawn_retention_task(
    sink: Arc<FileLogSink>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = sink.sweep_old_files();
                    if removed > 0 {
                        info!(removed, "log retention sweep removed files");
                    }
                }
                _ = shutdown.changed() => {
                    debug!("retention task stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "logsink_tests.rs"]
mod tests;
