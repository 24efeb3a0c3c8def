//! Shared test utilities
//!
//! Common helpers used across test modules. Only compiled in test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::Instant;

use crate::cue::{Cue, CuePlayer};

#[derive(Default)]
struct Recording {
    played: Mutex<Vec<(Instant, Cue)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Cue player that records every cue instead of playing it.
///
/// Clones share the same recording.
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    recording: Arc<Recording>,
    duration: Duration,
    fail_on: Option<Cue>,
    panic_on: Option<Cue>,
}

impl RecordingPlayer {
    /// Player whose cues finish instantly
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Player whose cues each take `duration` of (mocked) time
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Player that fails whenever `cue` is played
    #[must_use]
    pub fn failing_on(cue: Cue) -> Self {
        Self {
            fail_on: Some(cue),
            ..Self::default()
        }
    }

    /// Player that panics whenever `cue` is played
    #[must_use]
    pub fn panicking_on(cue: Cue) -> Self {
        Self {
            panic_on: Some(cue),
            ..Self::default()
        }
    }

    /// Cues played so far, in order
    #[must_use]
    pub fn played(&self) -> Vec<Cue> {
        self.timeline().into_iter().map(|(_, cue)| cue).collect()
    }

    /// Cues played so far with the instant each one started
    #[must_use]
    pub fn timeline(&self) -> Vec<(Instant, Cue)> {
        self.recording.played.lock().unwrap().clone()
    }

    /// Highest number of cues that were playing at the same time
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.recording.max_active.load(Ordering::SeqCst)
    }
}

impl CuePlayer for RecordingPlayer {
    async fn play(&self, cue: Cue) -> Result<()> {
        self.recording
            .played
            .lock()
            .unwrap()
            .push((Instant::now(), cue));
        assert!(self.panic_on != Some(cue), "simulated player panic for '{cue}'");
        if self.fail_on == Some(cue) {
            bail!("simulated audio failure for '{cue}'");
        }

        let active = self.recording.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.recording.max_active.fetch_max(active, Ordering::SeqCst);
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
        self.recording.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
