//! Breather - work/rest interval timer
//!
//! Breather alternates work periods and breaks, playing an audio cue at each
//! boundary. During a work period it also schedules short micro-breaks at
//! random intervals, each announced by its own pair of cues.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod config;
pub mod cue;
pub mod cycle;
pub mod log;
pub mod reconfig;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use config::{CueSetup, Overrides, Settings, TimerConfig};
pub use cue::{AnyPlayer, BellPlayer, CommandPlayer, Cue, CueFiles, CuePlayer, SerializedPlayer};
pub use cycle::cancel::{wait_ticks, CancelToken, Wait};
pub use cycle::controller::{ControllerOptions, PeriodController};
pub use cycle::params::{Bounds, ParamStore, Params};
pub use cycle::supervisor::{draw_wait_secs, MicroBreakSupervisor};
pub use log::{EventLog, EventRecord, JsonlLogger, TimerEvent};
