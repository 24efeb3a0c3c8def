//! Runtime reconfiguration of the micro-break range
//!
//! Reads `"<lower> <upper>"` lines (minutes) from an input stream, normally
//! stdin. Accepted lines replace the bounds used by the next micro-break
//! draw; anything else is logged and ignored.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cycle::params::{Bounds, ParamStore};
use crate::log::{EventLog, TimerEvent};

/// Parse one reconfiguration line into validated bounds.
///
/// Exactly two whitespace-separated non-negative integers are accepted, the
/// first must not exceed the second and neither may exceed
/// [`MAX_MINUTES`](crate::cycle::params::MAX_MINUTES).
pub fn parse_bounds_line(line: &str) -> Result<Bounds> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [lower, upper] = fields.as_slice() else {
        if fields.is_empty() {
            bail!("empty line");
        }
        bail!("expected 2 values, got {}", fields.len());
    };

    let lower = parse_minutes(lower)?;
    let upper = parse_minutes(upper)?;
    Bounds::new(lower, upper)
}

fn parse_minutes(field: &str) -> Result<u64> {
    let value: i64 = field
        .parse()
        .with_context(|| format!("'{field}' is not a whole number"))?;
    if value < 0 {
        bail!("'{field}' is negative");
    }
    u64::try_from(value).with_context(|| format!("'{field}' is out of range"))
}

/// Apply reconfiguration lines from `reader` until it is exhausted.
///
/// Never fails: a read error is logged and ends the listener, malformed
/// lines (including ones that are not valid UTF-8) are logged and skipped.
pub async fn listen<R>(mut reader: R, params: Arc<ParamStore>, events: Arc<EventLog>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => apply_line(&String::from_utf8_lossy(&buf), &params, &events),
            Err(err) => {
                events.record(
                    None,
                    TimerEvent::ReconfigRejected {
                        input: String::new(),
                        reason: format!("failed to read input: {err}"),
                    },
                );
                break;
            }
        }
    }
    events.record(None, TimerEvent::ReconfigClosed);
}

fn apply_line(line: &str, params: &ParamStore, events: &EventLog) {
    let applied = parse_bounds_line(line)
        .and_then(|bounds| params.set_microbreak_bounds(bounds.lower, bounds.upper));
    let event = match applied {
        Ok(bounds) => TimerEvent::BoundsUpdated {
            lower: bounds.lower,
            upper: bounds.upper,
        },
        Err(err) => TimerEvent::ReconfigRejected {
            input: line.trim().to_string(),
            reason: format!("{err:#}"),
        },
    };
    events.record(None, event);
}
