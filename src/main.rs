//! Breather - work/rest interval timer
//!
//! CLI entry point.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;

use breather::cli::{format_record, render_fatal};
use breather::config::{CueSetup, Overrides, TimerConfig};
use breather::cue::{AnyPlayer, BellPlayer, CommandPlayer, CuePlayer, SerializedPlayer};
use breather::cycle::controller::{ControllerOptions, PeriodController};
use breather::cycle::params::ParamStore;
use breather::log::{EventLog, JsonlLogger};
use breather::reconfig;

/// Work/rest interval timer with randomized micro-breaks
///
/// Plays a cue when a work period starts and ends, and pairs of cues for
/// short micro-breaks at random points during the period. While running,
/// type "<lower> <upper>" and press enter to change the micro-break range.
#[derive(Parser, Debug)]
#[command(name = "breather", version, about)]
struct Cli {
    /// Work period in minutes [default: 90]
    #[arg(short, long, allow_negative_numbers = true)]
    period: Option<i64>,

    /// Break in minutes [default: 20]
    #[arg(short = 'b', long = "break", allow_negative_numbers = true)]
    break_minutes: Option<i64>,

    /// Shortest wait before a micro-break, in minutes [default: 5]
    #[arg(short, long, allow_negative_numbers = true)]
    lower: Option<i64>,

    /// Longest wait before a micro-break, in minutes [default: 7]
    #[arg(short, long, allow_negative_numbers = true)]
    upper: Option<i64>,

    /// Length of a micro-break in seconds [default: 12]
    #[arg(long)]
    hold: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the JSONL event history (disabled when omitted)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Don't read micro-break ranges from stdin
    #[arg(long)]
    no_stdin: bool,

    /// Print the event history kept in --log-dir and exit
    #[arg(long, requires = "log_dir")]
    history: bool,
}

impl Cli {
    const fn overrides(&self) -> Overrides {
        Overrides {
            period: self.period,
            break_minutes: self.break_minutes,
            lower: self.lower,
            upper: self.upper,
            hold_secs: self.hold,
        }
    }
}

/// Build the player described by the configuration
fn build_player(cues: CueSetup) -> Result<AnyPlayer> {
    match cues {
        CueSetup::Command {
            program,
            args,
            files,
        } => Ok(AnyPlayer::Command(
            CommandPlayer::new(&program, &args, files).context("Failed to set up cue player")?,
        )),
        CueSetup::Bell => Ok(AnyPlayer::Bell(BellPlayer)),
    }
}

/// Run the controller until a fatal error or Ctrl-C
async fn drive<P: CuePlayer + 'static>(
    player: P,
    params: Arc<ParamStore>,
    events: Arc<EventLog>,
    options: ControllerOptions,
) -> Result<()> {
    let controller = PeriodController::new(Arc::new(player), params, events, options);

    tokio::select! {
        result = controller.run() => match result {
            Ok(never) => match never {},
            Err(err) => Err(err),
        },
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            eprintln!("\nInterrupted, exiting.");
            Ok(())
        }
    }
}

fn print_history(events: &EventLog) -> Result<()> {
    let records = events.history().context("Failed to read event history")?;
    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TimerConfig::from_path(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => TimerConfig::default(),
    };
    let settings = config.resolve(&cli.overrides())?;

    let events = Arc::new(match &cli.log_dir {
        Some(dir) => EventLog::with_history(
            JsonlLogger::new(dir).context("Failed to initialize JSONL event log")?,
        ),
        None => EventLog::stderr(),
    });
    if cli.history {
        return print_history(&events);
    }

    let params = Arc::new(ParamStore::new(settings.params)?);
    let player = build_player(settings.cues)?;

    if !cli.no_stdin {
        tokio::spawn(reconfig::listen(
            BufReader::new(tokio::io::stdin()),
            Arc::clone(&params),
            Arc::clone(&events),
        ));
    }

    if settings.serialize_cues {
        drive(SerializedPlayer::new(player), params, events, settings.options).await
    } else {
        drive(player, params, events, settings.options).await
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            render_fatal(&err);
            1
        }
    };

    // Exit directly: the stdin reader may still be blocked on a read
    std::process::exit(code);
}
