//! JSONL (JSON Lines) event history
//!
//! Provides append-only logging of timer events to `<log_dir>/events.jsonl`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use super::event::TimerEvent;

/// One line of the event history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Cycle the event belongs to (None for events outside any cycle)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u64>,
    /// The event itself
    pub event: TimerEvent,
}

/// JSONL logger for the timer's event history
///
/// Each line is a JSON object representing a single `EventRecord`.
pub struct JsonlLogger {
    log_path: PathBuf,
}

impl JsonlLogger {
    /// Create a new JSONL logger
    ///
    /// # Arguments
    /// * `log_dir` - Directory where events.jsonl will be stored
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        Ok(Self {
            log_path: log_dir.join("events.jsonl"),
        })
    }

    /// Append a record to the log
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the record cannot be
    /// serialized, or the write fails
    pub fn append(&self, record: &EventRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        let json = serde_json::to_string(record).context("Failed to serialize event to JSON")?;

        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read all records from the log, in the order they were written
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or any line is not a
    /// valid record
    pub fn read_all(&self) -> Result<Vec<EventRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        let mut records = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: EventRecord = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))?;

            records.push(record);
        }

        Ok(records)
    }

    /// Get the path to the log file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
