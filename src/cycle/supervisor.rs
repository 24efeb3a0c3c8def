//! Micro-break supervisor
//!
//! Runs for one work period. Each round waits a random time drawn from the
//! current micro-break bounds, plays the start cue, holds for a fixed time
//! and plays the end cue, until the period's token is triggered. The token
//! is checked every second of every wait; a cue that is already playing is
//! never interrupted.

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cue::{Cue, CuePlayer};
use crate::cycle::cancel::{wait_ticks, CancelToken, Wait};
use crate::cycle::params::{Bounds, ParamStore};
use crate::log::{EventLog, TimerEvent};

/// Default length of a micro-break in seconds
pub const DEFAULT_HOLD_SECS: u64 = 12;

/// Draw the wait before the next micro-break, in seconds.
///
/// Uniform over `[lower * 60, upper * 60]`, both ends included. A degenerate
/// range yields exactly `lower * 60`.
pub fn draw_wait_secs<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> u64 {
    rng.gen_range(bounds.lower_secs()..=bounds.upper_secs())
}

/// Schedules micro-breaks inside a single work period
pub struct MicroBreakSupervisor<P> {
    player: Arc<P>,
    params: Arc<ParamStore>,
    events: Arc<EventLog>,
    hold_secs: u64,
    cycle: u64,
    rng: StdRng,
}

impl<P: CuePlayer> MicroBreakSupervisor<P> {
    /// Create a supervisor for cycle number `cycle`
    #[must_use]
    pub fn new(
        player: Arc<P>,
        params: Arc<ParamStore>,
        events: Arc<EventLog>,
        hold_secs: u64,
        cycle: u64,
    ) -> Self {
        Self {
            player,
            params,
            events,
            hold_secs,
            cycle,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source, e.g. with a seeded one
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Supervise until `token` is triggered.
    ///
    /// Returns `Ok(())` only after observing cancellation. A cue failure is
    /// returned as an error and ends supervision.
    pub async fn run(mut self, token: CancelToken) -> Result<()> {
        loop {
            tokio::task::yield_now().await;

            let bounds = self.params.microbreak_bounds();
            let wait_secs = draw_wait_secs(bounds, &mut self.rng);
            self.record(TimerEvent::MicroBreakScheduled {
                wait_secs,
                lower: bounds.lower,
                upper: bounds.upper,
            });

            if wait_ticks(wait_secs, &token).await == Wait::Cancelled {
                break;
            }
            self.record(TimerEvent::MicroBreakStarted);
            self.player.play(Cue::MicroBreakStart).await?;

            if wait_ticks(self.hold_secs, &token).await == Wait::Cancelled {
                break;
            }
            self.record(TimerEvent::MicroBreakEnded);
            self.player.play(Cue::MicroBreakEnd).await?;
        }

        self.record(TimerEvent::SupervisorStopped);
        Ok(())
    }

    fn record(&self, event: TimerEvent) {
        self.events.record(Some(self.cycle), event);
    }
}
