// Log Sink
// Appends emitted events to a text log as `[<time>] <message>` lines

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::events::{LogCategory, LogEvent, SubscriptionId};
use super::job::SyncJob;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appending file log for one or more jobs
#[derive(Debug)]
pub struct FileLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLogSink {
    /// Open (or create) the log file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Arc::new(Self {
            path,
            file: Mutex::new(file),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe this sink to every category the job emits
    pub fn attach(self: &Arc<Self>, job: &mut SyncJob) -> SubscriptionId {
        let sink = Arc::clone(self);
        job.subscribe_all(move |event| sink.record(event))
    }

    /// Render one log line, without the trailing newline
    pub fn format_line(event: &LogEvent) -> String {
        let time = event.time.format(TIME_FORMAT);
        match event.category {
            LogCategory::Error => format!("[{}] ERROR {}", time, event.message),
            _ => format!("[{}] {}", time, event.message),
        }
    }

    /// Append one event; write failures are reported through tracing
    pub fn record(&self, event: &LogEvent) {
        let line = Self::format_line(event);
        let result = match self.file.lock() {
            Ok(mut file) => writeln!(file, "{}", line),
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "log file lock poisoned");
                return;
            }
        };

        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append to log file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn event_at(category: LogCategory, message: &str) -> LogEvent {
        LogEvent {
            job: "docs".to_string(),
            category,
            message: message.to_string(),
            time: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            FileLogSink::format_line(&event_at(LogCategory::FileDeleted, "/dst/stale.txt")),
            "[2024-05-01 08:30:00] /dst/stale.txt"
        );
        assert_eq!(
            FileLogSink::format_line(&event_at(LogCategory::Error, "/src/a.txt: denied")),
            "[2024-05-01 08:30:00] ERROR /src/a.txt: denied"
        );
    }

    #[test]
    fn test_record_appends() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("logs/sync.log");
        let sink = FileLogSink::open(&path).unwrap();

        sink.record(&event_at(LogCategory::Finished, "first"));
        sink.record(&event_at(LogCategory::Finished, "second"));
        drop(sink);

        let reopened = FileLogSink::open(&path).unwrap();
        reopened.record(&event_at(LogCategory::Finished, "third"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with("third"));
    }
}
