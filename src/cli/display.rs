//! Terminal log lines for timer events
//!
//! Every line carries a local timestamp and goes to stderr so stdout stays
//! free. Cycle boundaries are cyan, micro-breaks blue, rejected input yellow
//! and fatal errors red.

use chrono::Local;
use colored::{ColoredString, Colorize};

use crate::log::{EventRecord, TimerEvent};

/// Timestamp layout of every log line
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Print one event as a log line
pub fn render_event(cycle: Option<u64>, event: &TimerEvent) {
    let message = format_event(cycle, event);
    let styled = style_for(event, &message);
    eprintln!("{} {styled}", timestamp().dimmed());
}

/// Print a non-fatal warning
pub fn render_warning(message: &str) {
    eprintln!(
        "{} {} {message}",
        timestamp().dimmed(),
        "warning:".yellow().bold()
    );
}

/// Print the error that is about to terminate the process
pub fn render_fatal(err: &anyhow::Error) {
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        "fatal:".red().bold(),
        format!("{err:#}").red()
    );
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn style_for(event: &TimerEvent, message: &str) -> ColoredString {
    match event {
        TimerEvent::CycleStarted | TimerEvent::CycleEnded => message.bold().cyan(),
        TimerEvent::MicroBreakStarted | TimerEvent::MicroBreakEnded => message.blue(),
        TimerEvent::ReconfigRejected { .. } | TimerEvent::SupervisorStillRunning { .. } => {
            message.yellow()
        }
        TimerEvent::BoundsUpdated { .. } => message.green(),
        _ => message.normal(),
    }
}

/// Human-readable text for an event
#[must_use]
pub fn format_event(cycle: Option<u64>, event: &TimerEvent) -> String {
    let cycle_label = cycle.map_or_else(String::new, |n| format!(" {n}"));
    match event {
        TimerEvent::CycleStarted => format!("Cycle{cycle_label} started"),
        TimerEvent::PeriodScheduled { minutes } => {
            format!("{} of focus remaining", plural_minutes(*minutes))
        }
        TimerEvent::CancelSignalled => "Signalling the micro-break timer to stop".to_string(),
        TimerEvent::CycleEnded => format!("Cycle{cycle_label} finished, time for a break"),
        TimerEvent::BreakScheduled { minutes } => {
            format!("{} of break remaining", plural_minutes(*minutes))
        }
        TimerEvent::BreakFinished => "Break over".to_string(),
        TimerEvent::MicroBreakScheduled {
            wait_secs,
            lower,
            upper,
        } => format!(
            "Next micro-break in {} (drawn from {lower}-{upper} minutes)",
            format_wait(*wait_secs)
        ),
        TimerEvent::MicroBreakStarted => {
            "Micro-break: take a deep breath or close your eyes".to_string()
        }
        TimerEvent::MicroBreakEnded => "Micro-break over".to_string(),
        TimerEvent::SupervisorStopped => "Micro-break timer stopped".to_string(),
        TimerEvent::SupervisorStillRunning { grace_secs } => {
            format!("Micro-break timer still busy after {grace_secs}s, continuing without it")
        }
        TimerEvent::BoundsUpdated { lower, upper } => {
            format!("Micro-break range set to {lower}-{upper} minutes")
        }
        TimerEvent::ReconfigRejected { input, reason } => {
            format!("Ignoring input {input:?}: {reason} (expected \"<lower> <upper>\")")
        }
        TimerEvent::ReconfigClosed => "Reconfiguration input closed".to_string(),
    }
}

/// One line of a printed event history, in local time
#[must_use]
pub fn format_record(record: &EventRecord) -> String {
    format!(
        "{} {}",
        record
            .timestamp
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT),
        format_event(record.cycle, &record.event)
    )
}

/// Format a number of seconds as `m:ss`
#[must_use]
pub fn format_wait(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn plural_minutes(minutes: u64) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}
