//! Period controller
//!
//! Drives the endless work/break loop. Each cycle plays the start cue,
//! starts a micro-break supervisor bound to a fresh cancellation token,
//! sleeps through the work period, triggers the token, plays the end cue and
//! sleeps through the break.
//!
//! Triggering the token does not wait for the supervisor by default: a
//! micro-break cue that is already playing can overlap the end cue. A
//! non-zero `handoff_grace` waits up to that long for the supervisor to exit
//! before the end cue.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Error, Result};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::cue::{Cue, CuePlayer};
use crate::cycle::cancel::CancelToken;
use crate::cycle::params::ParamStore;
use crate::cycle::supervisor::{MicroBreakSupervisor, DEFAULT_HOLD_SECS};
use crate::log::{EventLog, TimerEvent};

/// Tunables of the controller that are fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Length of each micro-break in seconds
    pub hold_secs: u64,
    /// How long to wait for the supervisor after cancelling it (zero: don't wait)
    pub handoff_grace: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            hold_secs: DEFAULT_HOLD_SECS,
            handoff_grace: Duration::ZERO,
        }
    }
}

/// Top-level work/break driver
pub struct PeriodController<P> {
    player: Arc<P>,
    params: Arc<ParamStore>,
    events: Arc<EventLog>,
    options: ControllerOptions,
}

impl<P: CuePlayer + 'static> PeriodController<P> {
    /// Create a controller
    #[must_use]
    pub const fn new(
        player: Arc<P>,
        params: Arc<ParamStore>,
        events: Arc<EventLog>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            player,
            params,
            events,
            options,
        }
    }

    /// Run cycles forever.
    ///
    /// Only returns on a fatal error: a cue failure in the controller itself
    /// or in any micro-break supervisor it started.
    pub async fn run(&self) -> Result<Infallible> {
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
        let mut number: u64 = 0;

        loop {
            number += 1;
            tokio::select! {
                result = self.run_cycle(number, &fatal_tx) => result?,
                Some(err) = fatal_rx.recv() => return Err(err),
            }
        }
    }

    /// Run one full cycle: start cue, work period, end cue, break.
    ///
    /// A supervisor failure is sent to `fatal` rather than returned, since
    /// the supervisor may still be running after this returns.
    pub async fn run_cycle(&self, number: u64, fatal: &UnboundedSender<Error>) -> Result<()> {
        self.record(number, TimerEvent::CycleStarted);
        self.player.play(Cue::CycleStart).await?;

        let token = CancelToken::new();
        let supervisor = self.spawn_supervisor(number, token.clone(), fatal.clone());

        let period_minutes = self.params.period_minutes();
        self.record(
            number,
            TimerEvent::PeriodScheduled {
                minutes: period_minutes,
            },
        );
        tokio::time::sleep(minutes(period_minutes)).await;

        token.trigger();
        self.record(number, TimerEvent::CancelSignalled);
        self.hand_off(number, supervisor).await;

        self.record(number, TimerEvent::CycleEnded);
        self.player.play(Cue::CycleEnd).await?;

        let break_minutes = self.params.break_minutes();
        self.record(
            number,
            TimerEvent::BreakScheduled {
                minutes: break_minutes,
            },
        );
        tokio::time::sleep(minutes(break_minutes)).await;
        self.record(number, TimerEvent::BreakFinished);

        Ok(())
    }

    fn spawn_supervisor(
        &self,
        number: u64,
        token: CancelToken,
        fatal: UnboundedSender<Error>,
    ) -> JoinHandle<()> {
        let supervisor = MicroBreakSupervisor::new(
            Arc::clone(&self.player),
            Arc::clone(&self.params),
            Arc::clone(&self.events),
            self.options.hold_secs,
            number,
        );
        // Spawned on its own so a panic comes back as a `JoinError`
        let task = tokio::spawn(supervisor.run(token));
        tokio::spawn(async move {
            let err = match task.await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => err,
                Err(err) if err.is_cancelled() => return,
                Err(err) => Error::new(err),
            };
            // The receiver only disappears when the controller is gone
            let _ = fatal.send(err.context(format!("Micro-break timer failed in cycle {number}")));
        })
    }

    async fn hand_off(&self, number: u64, supervisor: JoinHandle<()>) {
        let grace = self.options.handoff_grace;
        if grace.is_zero() {
            return;
        }
        if tokio::time::timeout(grace, supervisor).await.is_err() {
            self.record(
                number,
                TimerEvent::SupervisorStillRunning {
                    grace_secs: grace.as_secs(),
                },
            );
        }
    }

    fn record(&self, number: u64, event: TimerEvent) {
        self.events.record(Some(number), event);
    }
}

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::params::{Bounds, Params};
    use crate::log::JsonlLogger;
    use crate::testutil::RecordingPlayer;
    use tempfile::TempDir;
    use tokio::time::Instant;

    fn store(period: u64, brk: u64, lower: u64, upper: u64) -> Arc<ParamStore> {
        Arc::new(
            ParamStore::new(Params {
                period_minutes: period,
                break_minutes: brk,
                bounds: Bounds::new(lower, upper).unwrap(),
            })
            .unwrap(),
        )
    }

    fn controller(
        player: &RecordingPlayer,
        params: Arc<ParamStore>,
        tmp: &TempDir,
        options: ControllerOptions,
    ) -> PeriodController<RecordingPlayer> {
        let events = EventLog::history_only(JsonlLogger::new(tmp.path()).unwrap());
        PeriodController::new(
            Arc::new(player.clone()),
            params,
            Arc::new(events),
            options,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_plays_start_then_end_and_sleeps_break() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::new();
        let ctrl = controller(
            &player,
            store(25, 5, 100, 100),
            &tmp,
            ControllerOptions::default(),
        );
        let (fatal, _rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        ctrl.run_cycle(1, &fatal).await.unwrap();

        let timeline = player.timeline();
        assert_eq!(player.played(), vec![Cue::CycleStart, Cue::CycleEnd]);
        assert_eq!(timeline[0].0 - start, Duration::ZERO);
        assert_eq!(timeline[1].0 - start, Duration::from_secs(25 * 60));
        assert_eq!(start.elapsed(), Duration::from_secs(30 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_events_are_recorded_in_order() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::new();
        let ctrl = controller(
            &player,
            store(1, 1, 100, 100),
            &tmp,
            ControllerOptions::default(),
        );
        let (fatal, _rx) = mpsc::unbounded_channel();

        ctrl.run_cycle(7, &fatal).await.unwrap();
        // Let the cancelled supervisor observe the token
        tokio::time::sleep(Duration::from_secs(1)).await;

        let controller_events: Vec<TimerEvent> = ctrl
            .events
            .history()
            .unwrap()
            .into_iter()
            .filter(|r| r.cycle == Some(7))
            .map(|r| r.event)
            .filter(|e| {
                !matches!(
                    e,
                    TimerEvent::MicroBreakScheduled { .. } | TimerEvent::SupervisorStopped
                )
            })
            .collect();
        assert_eq!(
            controller_events,
            vec![
                TimerEvent::CycleStarted,
                TimerEvent::PeriodScheduled { minutes: 1 },
                TimerEvent::CancelSignalled,
                TimerEvent::CycleEnded,
                TimerEvent::BreakScheduled { minutes: 1 },
                TimerEvent::BreakFinished,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_never_returns_on_its_own() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::new();
        let ctrl = controller(
            &player,
            store(1, 1, 0, 0),
            &tmp,
            ControllerOptions::default(),
        );

        let outcome = tokio::time::timeout(Duration::from_secs(3 * 3600), ctrl.run()).await;

        assert!(outcome.is_err(), "run() should still be running");
        let starts = player
            .played()
            .into_iter()
            .filter(|c| *c == Cue::CycleStart)
            .count();
        assert!(starts >= 80, "expected many cycles, got {starts}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_controller_cue_failure() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::failing_on(Cue::CycleEnd);
        let ctrl = controller(
            &player,
            store(1, 1, 100, 100),
            &tmp,
            ControllerOptions::default(),
        );

        let err = ctrl.run().await.unwrap_err();

        assert!(err.to_string().contains("cycle_end"));
        assert_eq!(player.played(), vec![Cue::CycleStart, Cue::CycleEnd]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_supervisor_cue_failure() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::failing_on(Cue::MicroBreakStart);
        let ctrl = controller(
            &player,
            store(60, 20, 1, 1),
            &tmp,
            ControllerOptions::default(),
        );
        let start = Instant::now();

        let err = ctrl.run().await.unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Micro-break timer failed in cycle 1"));
        assert!(message.contains("micro_break_start"));
        // Failure surfaces as soon as the first micro-break fires, mid-period
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_supervisor_panic() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::panicking_on(Cue::MicroBreakStart);
        let ctrl = controller(
            &player,
            store(60, 20, 1, 1),
            &tmp,
            ControllerOptions::default(),
        );

        let err = tokio::time::timeout(Duration::from_secs(3600), ctrl.run())
            .await
            .expect("a panicking supervisor should end the controller")
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("Micro-break timer failed in cycle 1"));
        assert!(message.contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_supervisor_may_overlap_end_cue() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::with_duration(Duration::from_secs(7));
        let ctrl = controller(
            &player,
            store(1, 0, 0, 0),
            &tmp,
            ControllerOptions {
                hold_secs: 0,
                handoff_grace: Duration::ZERO,
            },
        );
        let (fatal, _rx) = mpsc::unbounded_channel();

        ctrl.run_cycle(1, &fatal).await.unwrap();

        // A micro-break cue runs from 63s to 70s; the end cue starts at 67s
        assert_eq!(player.max_concurrent(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handoff_grace_waits_for_supervisor_before_end_cue() {
        let tmp = TempDir::new().unwrap();
        let player = RecordingPlayer::with_duration(Duration::from_secs(7));
        let ctrl = controller(
            &player,
            store(1, 0, 0, 0),
            &tmp,
            ControllerOptions {
                hold_secs: 0,
                handoff_grace: Duration::from_secs(30),
            },
        );
        let (fatal, _rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        ctrl.run_cycle(1, &fatal).await.unwrap();

        assert_eq!(player.max_concurrent(), 1);
        let (end_at, end_cue) = *player.timeline().last().unwrap();
        assert_eq!(end_cue, Cue::CycleEnd);
        assert_eq!(end_at - start, Duration::from_secs(70));
    }
}
