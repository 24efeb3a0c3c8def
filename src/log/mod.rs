//! Logging and observability
//!
//! Timer events are rendered as log lines on stderr and can additionally be
//! appended to a JSONL history file.

pub mod event;
pub mod jsonl;

use std::sync::Mutex;

use chrono::Utc;

use crate::cli::display;

pub use event::TimerEvent;
pub use jsonl::{EventRecord, JsonlLogger};

/// Event sink shared by every task of the timer
pub struct EventLog {
    history: Option<Mutex<JsonlLogger>>,
    echo: bool,
}

impl EventLog {
    /// Echo events to stderr only
    #[must_use]
    pub const fn stderr() -> Self {
        Self {
            history: None,
            echo: true,
        }
    }

    /// Echo events to stderr and append them to a JSONL history
    #[must_use]
    pub const fn with_history(logger: JsonlLogger) -> Self {
        Self {
            history: Some(Mutex::new(logger)),
            echo: true,
        }
    }

    /// Keep only the JSONL history, without stderr output
    #[must_use]
    pub const fn history_only(logger: JsonlLogger) -> Self {
        Self {
            history: Some(Mutex::new(logger)),
            echo: false,
        }
    }

    /// Report an event.
    ///
    /// A failed history write is reported on stderr and otherwise ignored;
    /// the timer keeps running.
    pub fn record(&self, cycle: Option<u64>, event: TimerEvent) {
        if self.echo {
            display::render_event(cycle, &event);
        }

        let Some(history) = &self.history else {
            return;
        };
        let record = EventRecord {
            timestamp: Utc::now(),
            cycle,
            event,
        };
        let logger = history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(err) = logger.append(&record) {
            display::render_warning(&format!("{err:#}"));
        }
    }

    /// Read back the JSONL history, or an empty list when none is kept
    pub fn history(&self) -> anyhow::Result<Vec<EventRecord>> {
        match &self.history {
            Some(history) => history
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .read_all(),
            None => Ok(Vec::new()),
        }
    }
}
