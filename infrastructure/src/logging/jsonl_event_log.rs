//! JSONL file writer for run events.
//!
//! Each [`RunEvent`] is serialized as a single JSON line carrying its `type`
//! tag plus a `timestamp`, appended to the file via a buffered writer.

use council_application::RunEventSink;
use council_domain::RunEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only run event log, one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and
/// on `Drop`. Write errors are swallowed so a broken log never fails a run.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: &RunEvent) -> Option<serde_json::Value> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert(
                    "timestamp".to_string(),
                    serde_json::Value::String(timestamp),
                );
                Some(serde_json::Value::Object(map))
            }
            Ok(other) => Some(serde_json::json!({
                "type": event.kind(),
                "timestamp": timestamp,
                "data": other,
            })),
            Err(e) => {
                warn!(kind = event.kind(), "Could not serialize run event: {}", e);
                None
            }
        }
    }
}

impl RunEventSink for JsonlEventLog {
    fn emit(&self, event: &RunEvent) {
        let Some(record) = Self::record(event) else {
            return;
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{BranchKey, InvocationId, RunPhase};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_event_log_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.events.jsonl");
        let log = JsonlEventLog::open(&path).unwrap();

        log.emit(&RunEvent::PhaseChanged {
            phase: RunPhase::Analyzing,
        });
        log.emit(&RunEvent::StepStarted {
            invocation: InvocationId(1),
            branch: Some(BranchKey::new("pacing")),
            tool_name: "list_clips".to_string(),
            arguments: serde_json::json!({"track": 1}),
        });
        drop(log);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "phase_changed");
        assert_eq!(lines[0]["phase"], "analyzing");
        assert_eq!(lines[1]["type"], "step_started");
        assert_eq!(lines[1]["tool_name"], "list_clips");
        assert_eq!(lines[1]["arguments"]["track"], 1);
        for line in &lines {
            let ts = line["timestamp"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
        }
    }

    #[test]
    fn test_event_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let event = RunEvent::PhaseChanged {
            phase: RunPhase::Done,
        };

        JsonlEventLog::open(&path).unwrap().emit(&event);
        JsonlEventLog::open(&path).unwrap().emit(&event);

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_event_log_unopenable_path_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for appending
        assert!(JsonlEventLog::open(dir.path()).is_none());
    }
}
