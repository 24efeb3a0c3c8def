//! Cycle scheduling
//!
//! The period controller, the micro-break supervisor it runs during each
//! work period, the cancellation token that ties the two together, and the
//! parameter store both read from.

pub mod cancel;
pub mod controller;
pub mod params;
pub mod supervisor;
