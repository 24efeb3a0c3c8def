//! Cancellation token and cancellation-aware waiting
//!
//! A `CancelToken` is a one-shot stop signal shared between the period
//! controller (the only party that triggers it) and any number of observers.
//! `wait_ticks` sleeps in one-second increments and checks the token at the
//! top of every increment, so an observer stops within one tick.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Length of one wait increment
pub const TICK: Duration = Duration::from_secs(1);

/// One-shot, many-observer stop signal
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    /// Create a new, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    /// Mark the token cancelled and wake every waiting observer.
    ///
    /// Calling this more than once is a no-op.
    pub fn trigger(&self) {
        self.inner.cancel();
    }

    /// Current cancellation state. Never blocks.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once the token has been triggered
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

/// How a cancellable wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The full duration passed without cancellation
    Elapsed,
    /// The token was triggered before the wait finished
    Cancelled,
}

/// Sleep for `seconds` one tick at a time, stopping early on cancellation.
///
/// The token is checked before every tick and after the last one, and a tick
/// in progress is cut short the moment the token fires.
pub async fn wait_ticks(seconds: u64, token: &CancelToken) -> Wait {
    for _ in 0..seconds {
        if token.is_cancelled() {
            return Wait::Cancelled;
        }
        tokio::select! {
            () = tokio::time::sleep(TICK) => {}
            () = token.cancelled() => return Wait::Cancelled,
        }
    }

    if token.is_cancelled() {
        Wait::Cancelled
    } else {
        Wait::Elapsed
    }
}
