//! Timer configuration
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! and command-line flags, each overriding the one before. The result is
//! validated once at startup; any problem is a startup error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cue::CueFiles;
use crate::cycle::controller::ControllerOptions;
use crate::cycle::params::{
    check_minutes, Bounds, Params, DEFAULT_BREAK_MINUTES, DEFAULT_LOWER_MINUTES,
    DEFAULT_PERIOD_MINUTES, DEFAULT_UPPER_MINUTES,
};
use crate::cycle::supervisor::DEFAULT_HOLD_SECS;

/// `[timer]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimerSection {
    /// Work period in minutes
    pub period: Option<i64>,
    /// Break in minutes
    #[serde(rename = "break")]
    pub break_minutes: Option<i64>,
    /// Lower bound of the micro-break wait in minutes
    pub lower: Option<i64>,
    /// Upper bound of the micro-break wait in minutes
    pub upper: Option<i64>,
    /// Length of a micro-break in seconds
    pub hold_secs: Option<u64>,
    /// Seconds to wait for the micro-break timer after a period ends
    pub handoff_grace_secs: Option<u64>,
    /// Never let two cues play at once
    pub serialize_cues: Option<bool>,
}

/// `[cues]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CueSection {
    /// Audio player program; the cue file is passed as its last argument
    pub player: Option<String>,
    /// Extra arguments placed before the cue file
    #[serde(default)]
    pub player_args: Vec<String>,
    /// Played when a work period begins
    pub cycle_start: Option<PathBuf>,
    /// Played when a work period ends
    pub cycle_end: Option<PathBuf>,
    /// Played when a micro-break begins
    pub micro_break_start: Option<PathBuf>,
    /// Played when a micro-break ends (defaults to `cycle_start`)
    pub micro_break_end: Option<PathBuf>,
}

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    /// Timing settings
    #[serde(default)]
    pub timer: TimerSection,
    /// Cue settings
    #[serde(default)]
    pub cues: CueSection,
    /// Directory relative cue paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--period`
    pub period: Option<i64>,
    /// `--break`
    pub break_minutes: Option<i64>,
    /// `--lower`
    pub lower: Option<i64>,
    /// `--upper`
    pub upper: Option<i64>,
    /// `--hold`
    pub hold_secs: Option<u64>,
}

/// How cues should be played
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueSetup {
    /// Run an external player on cue files
    Command {
        /// Player program
        program: String,
        /// Arguments before the cue file
        args: Vec<String>,
        /// Cue files
        files: CueFiles,
    },
    /// No cue files configured: ring the terminal bell
    Bell,
}

/// Fully resolved and validated startup settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Initial runtime parameters
    pub params: Params,
    /// Controller tunables
    pub options: ControllerOptions,
    /// Whether cue playback is serialized
    pub serialize_cues: bool,
    /// How cues are played
    pub cues: CueSetup,
}

impl TimerConfig {
    /// Parse a configuration file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration content from a string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse timer configuration")
    }

    /// Merge with command-line overrides and validate
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings> {
        let timer = &self.timer;
        let period = overrides
            .period
            .or(timer.period)
            .map_or(Ok(DEFAULT_PERIOD_MINUTES), |v| minutes_value("period", v))?;
        let break_minutes = overrides
            .break_minutes
            .or(timer.break_minutes)
            .map_or(Ok(DEFAULT_BREAK_MINUTES), |v| minutes_value("break", v))?;
        let lower = overrides
            .lower
            .or(timer.lower)
            .map_or(Ok(DEFAULT_LOWER_MINUTES), |v| minutes_value("lower", v))?;
        let upper = overrides
            .upper
            .or(timer.upper)
            .map_or(Ok(DEFAULT_UPPER_MINUTES), |v| minutes_value("upper", v))?;
        let bounds = Bounds::new(lower, upper)?;

        let options = ControllerOptions {
            hold_secs: overrides
                .hold_secs
                .or(timer.hold_secs)
                .unwrap_or(DEFAULT_HOLD_SECS),
            handoff_grace: Duration::from_secs(timer.handoff_grace_secs.unwrap_or(0)),
        };

        Ok(Settings {
            params: Params {
                period_minutes: period,
                break_minutes,
                bounds,
            },
            options,
            serialize_cues: timer.serialize_cues.unwrap_or(false),
            cues: self.resolve_cues()?,
        })
    }

    fn resolve_cues(&self) -> Result<CueSetup> {
        let cues = &self.cues;
        let given = [&cues.cycle_start, &cues.cycle_end, &cues.micro_break_start];
        if given.iter().all(|p| p.is_none()) {
            if cues.micro_break_end.is_some() {
                bail!("'micro_break_end' is set but the other cue files are not");
            }
            return Ok(CueSetup::Bell);
        }

        let required = |name: &str, path: &Option<PathBuf>| -> Result<PathBuf> {
            path.as_ref()
                .map(|p| self.resolve_path(p))
                .with_context(|| format!("Cue file '{name}' is required when any cue file is set"))
        };
        let cycle_start = required("cycle_start", &cues.cycle_start)?;
        let files = CueFiles {
            cycle_end: required("cycle_end", &cues.cycle_end)?,
            micro_break_start: required("micro_break_start", &cues.micro_break_start)?,
            micro_break_end: cues
                .micro_break_end
                .as_ref()
                .map_or_else(|| cycle_start.clone(), |p| self.resolve_path(p)),
            cycle_start,
        };

        let program = match &cues.player {
            Some(p) if p.trim().is_empty() => bail!("'player' cannot be empty"),
            Some(p) => p.clone(),
            None => default_player().to_string(),
        };

        Ok(CueSetup::Command {
            program,
            args: cues.player_args.clone(),
            files,
        })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Player used when the config names cue files but no player
#[must_use]
pub const fn default_player() -> &'static str {
    if cfg!(target_os = "macos") {
        "afplay"
    } else {
        "paplay"
    }
}

fn minutes_value(name: &str, value: i64) -> Result<u64> {
    let minutes =
        u64::try_from(value).map_err(|_| anyhow::anyhow!("'{name}' must be >= 0, got {value}"))?;
    check_minutes(name, minutes)
}
