//! Runtime parameter store
//!
//! Holds the period length, break length and micro-break bounds shared by
//! the controller, the supervisor and the reconfiguration listener. Every
//! access goes through one `RwLock`, so a reader always sees a whole pair of
//! bounds, never half of an update.

use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Result};

/// Default work period in minutes
pub const DEFAULT_PERIOD_MINUTES: u64 = 90;
/// Default break in minutes
pub const DEFAULT_BREAK_MINUTES: u64 = 20;
/// Default lower bound of the micro-break wait in minutes
pub const DEFAULT_LOWER_MINUTES: u64 = 5;
/// Default upper bound of the micro-break wait in minutes
pub const DEFAULT_UPPER_MINUTES: u64 = 7;
/// Longest accepted period, break or micro-break bound: one week
pub const MAX_MINUTES: u64 = 7 * 24 * 60;

/// Reject a minute count above [`MAX_MINUTES`]
pub fn check_minutes(name: &str, minutes: u64) -> Result<u64> {
    if minutes > MAX_MINUTES {
        bail!("'{name}' must be at most {MAX_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}

/// Snapshot of the runtime parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Work period length in minutes
    pub period_minutes: u64,
    /// Break length in minutes
    pub break_minutes: u64,
    /// Micro-break wait range in minutes
    pub bounds: Bounds,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            period_minutes: DEFAULT_PERIOD_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            bounds: Bounds {
                lower: DEFAULT_LOWER_MINUTES,
                upper: DEFAULT_UPPER_MINUTES,
            },
        }
    }
}

/// Inclusive micro-break wait range in minutes. `lower <= upper` always holds
/// for bounds produced by [`Bounds::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Shortest wait in minutes
    pub lower: u64,
    /// Longest wait in minutes
    pub upper: u64,
}

impl Bounds {
    /// Build a validated range, rejecting `lower > upper` and values above
    /// [`MAX_MINUTES`].
    pub fn new(lower: u64, upper: u64) -> Result<Self> {
        check_minutes("lower", lower)?;
        check_minutes("upper", upper)?;
        if lower > upper {
            bail!("lower bound ({lower}) must not exceed upper bound ({upper})");
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound in seconds
    #[must_use]
    pub const fn lower_secs(self) -> u64 {
        self.lower * 60
    }

    /// Upper bound in seconds
    #[must_use]
    pub const fn upper_secs(self) -> u64 {
        self.upper * 60
    }
}

/// Shared, lock-guarded runtime parameters
#[derive(Debug)]
pub struct ParamStore {
    params: RwLock<Params>,
}

impl ParamStore {
    /// Create a store, validating every initial value
    pub fn new(params: Params) -> Result<Self> {
        check_minutes("period", params.period_minutes)?;
        check_minutes("break", params.break_minutes)?;
        Bounds::new(params.bounds.lower, params.bounds.upper)?;
        Ok(Self {
            params: RwLock::new(params),
        })
    }

    /// Consistent copy of every parameter
    #[must_use]
    pub fn snapshot(&self) -> Params {
        *self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Work period length in minutes
    #[must_use]
    pub fn period_minutes(&self) -> u64 {
        self.snapshot().period_minutes
    }

    /// Break length in minutes
    #[must_use]
    pub fn break_minutes(&self) -> u64 {
        self.snapshot().break_minutes
    }

    /// Current micro-break bounds
    #[must_use]
    pub fn microbreak_bounds(&self) -> Bounds {
        self.snapshot().bounds
    }

    /// Replace the micro-break bounds.
    ///
    /// An invalid pair is rejected and the previous bounds stay in place.
    pub fn set_microbreak_bounds(&self, lower: u64, upper: u64) -> Result<Bounds> {
        let bounds = Bounds::new(lower, upper)?;
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .bounds = bounds;
        Ok(bounds)
    }
}
