//! Append-only event log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::{info, warn};

use ecf_sequence_core::EventSink;

use crate::error::Result;

/// Writes each event as a timestamped line to a log file and mirrors it to
/// `tracing`.
#[derive(Debug)]
pub struct FileEventSink {
    file: Mutex<File>,
}

impl FileEventSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, message: &str) {
        info!(target: "ecf_sequence::events", "{}", message);

        let line = format!("{}: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            warn!(error = %e, "failed to write event log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_appended_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequence.log");

        let sink = FileEventSink::open(&path).unwrap();
        sink.record("Generated sequence: E320000000006");
        drop(sink);

        let sink = FileEventSink::open(&path).unwrap();
        sink.record("Generated sequence: E320000000007");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": Generated sequence: E320000000006"));
        assert!(lines[1].ends_with(": Generated sequence: E320000000007"));
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(lines[0].find(": Generated"), Some(19));
    }
}
