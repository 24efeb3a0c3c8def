//! Timer events
//!
//! Every observable state transition of the timer is a `TimerEvent`. Events
//! are echoed to stderr as log lines and, when enabled, appended to the JSONL
//! event history.

use serde::{Deserialize, Serialize};

/// A single state transition reported by the controller, the supervisor or
/// the reconfiguration listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerEvent {
    /// A new cycle began and its start cue played
    CycleStarted,
    /// The work period sleep began
    PeriodScheduled {
        /// Length of the period in minutes
        minutes: u64,
    },
    /// The controller triggered the period's cancellation token
    CancelSignalled,
    /// The work period is over
    CycleEnded,
    /// The break sleep began
    BreakScheduled {
        /// Length of the break in minutes
        minutes: u64,
    },
    /// The break sleep finished
    BreakFinished,
    /// The supervisor drew the wait before the next micro-break
    MicroBreakScheduled {
        /// Drawn wait in seconds
        wait_secs: u64,
        /// Lower bound the wait was drawn from, in minutes
        lower: u64,
        /// Upper bound the wait was drawn from, in minutes
        upper: u64,
    },
    /// A micro-break began
    MicroBreakStarted,
    /// A micro-break ended
    MicroBreakEnded,
    /// The supervisor observed cancellation and exited
    SupervisorStopped,
    /// The supervisor did not exit within the handoff grace period
    SupervisorStillRunning {
        /// Grace period that elapsed, in seconds
        grace_secs: u64,
    },
    /// New micro-break bounds were accepted
    BoundsUpdated {
        /// New lower bound in minutes
        lower: u64,
        /// New upper bound in minutes
        upper: u64,
    },
    /// A reconfiguration line was rejected
    ReconfigRejected {
        /// The offending input, trimmed
        input: String,
        /// Why it was rejected
        reason: String,
    },
    /// The reconfiguration input stream ended
    ReconfigClosed,
}
