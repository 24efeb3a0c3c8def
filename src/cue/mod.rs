//! Audio cues
//!
//! The timer only needs to say "play this cue and tell me when it is done".
//! `CuePlayer` is that seam; `CommandPlayer` hands cue files to an external
//! audio player, `BellPlayer` rings the terminal bell when no cue files are
//! configured, and `SerializedPlayer` keeps cues from overlapping.

pub mod command;

use std::fmt;
use std::future::Future;
use std::io::Write as IoWrite;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

pub use command::{CommandPlayer, CueFiles};

/// Event boundaries that have a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// A work period begins
    CycleStart,
    /// A work period ends
    CycleEnd,
    /// A micro-break begins
    MicroBreakStart,
    /// A micro-break ends
    MicroBreakEnd,
}

impl Cue {
    /// Every cue, in the order they occur within a cycle
    pub const ALL: [Self; 4] = [
        Self::CycleStart,
        Self::MicroBreakStart,
        Self::MicroBreakEnd,
        Self::CycleEnd,
    ];

    /// Name used in configuration and error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CycleStart => "cycle_start",
            Self::CycleEnd => "cycle_end",
            Self::MicroBreakStart => "micro_break_start",
            Self::MicroBreakEnd => "micro_break_end",
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plays cues. `play` resolves once playback has finished.
pub trait CuePlayer: Send + Sync {
    /// Play `cue` to completion
    fn play(&self, cue: Cue) -> impl Future<Output = Result<()>> + Send;
}

/// Pause between rings of one cue, so terminals don't merge them
const BELL_GAP: Duration = Duration::from_millis(300);

/// Rings the terminal bell, a different number of times per cue
#[derive(Debug, Clone, Copy, Default)]
pub struct BellPlayer;

impl BellPlayer {
    /// Number of rings that make up `cue`
    #[must_use]
    pub const fn rings(cue: Cue) -> usize {
        match cue {
            Cue::CycleStart | Cue::MicroBreakEnd => 1,
            Cue::MicroBreakStart => 2,
            Cue::CycleEnd => 3,
        }
    }
}

impl CuePlayer for BellPlayer {
    async fn play(&self, cue: Cue) -> Result<()> {
        for ring in 0..Self::rings(cue) {
            if ring > 0 {
                tokio::time::sleep(BELL_GAP).await;
            }
            let mut stdout = std::io::stdout();
            stdout
                .write_all(b"\x07")
                .and_then(|()| stdout.flush())
                .with_context(|| format!("Failed to ring terminal bell for cue '{cue}'"))?;
        }
        Ok(())
    }
}

/// Either player the binary can be configured with
#[derive(Debug)]
pub enum AnyPlayer {
    /// External audio player
    Command(CommandPlayer),
    /// Terminal bell
    Bell(BellPlayer),
}

impl CuePlayer for AnyPlayer {
    async fn play(&self, cue: Cue) -> Result<()> {
        match self {
            Self::Command(player) => player.play(cue).await,
            Self::Bell(player) => player.play(cue).await,
        }
    }
}

/// Wraps a player so at most one cue plays at a time.
///
/// Without it, the micro-break timer's last cue may overlap the cycle end
/// cue.
#[derive(Debug)]
pub struct SerializedPlayer<P> {
    inner: P,
    lock: Mutex<()>,
}

impl<P> SerializedPlayer<P> {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl<P: CuePlayer> CuePlayer for SerializedPlayer<P> {
    async fn play(&self, cue: Cue) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.inner.play(cue).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingPlayer;
    use std::sync::Arc;

    #[test]
    fn test_cue_names() {
        assert_eq!(Cue::CycleStart.name(), "cycle_start");
        assert_eq!(Cue::CycleEnd.to_string(), "cycle_end");
        assert_eq!(Cue::MicroBreakStart.name(), "micro_break_start");
        assert_eq!(Cue::MicroBreakEnd.name(), "micro_break_end");
    }

    #[test]
    fn test_bell_patterns_tell_cycle_cues_apart() {
        assert_eq!(BellPlayer::rings(Cue::CycleStart), 1);
        assert_eq!(BellPlayer::rings(Cue::MicroBreakStart), 2);
        assert_eq!(BellPlayer::rings(Cue::CycleEnd), 3);
        assert_ne!(
            BellPlayer::rings(Cue::CycleStart),
            BellPlayer::rings(Cue::CycleEnd)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bell_player_spaces_out_rings() {
        let start = tokio::time::Instant::now();
        BellPlayer.play(Cue::CycleEnd).await.unwrap();
        assert_eq!(start.elapsed(), BELL_GAP * 2);
    }

    #[tokio::test]
    async fn test_bell_player_succeeds() {
        BellPlayer.play(Cue::CycleStart).await.unwrap();
    }

    #[tokio::test]
    async fn test_any_player_delegates_to_bell() {
        AnyPlayer::Bell(BellPlayer).play(Cue::CycleEnd).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialized_player_never_overlaps() {
        let recorder = RecordingPlayer::with_duration(Duration::from_secs(3));
        let player = Arc::new(SerializedPlayer::new(recorder.clone()));

        let first = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(Cue::MicroBreakEnd).await })
        };
        let second = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(Cue::CycleEnd).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(recorder.max_concurrent(), 1);
        assert_eq!(recorder.played().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserialized_cues_may_overlap() {
        let recorder = RecordingPlayer::with_duration(Duration::from_secs(3));
        let player = Arc::new(recorder.clone());

        let first = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(Cue::MicroBreakEnd).await })
        };
        let second = {
            let player = Arc::clone(&player);
            tokio::spawn(async move { player.play(Cue::CycleEnd).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(recorder.max_concurrent(), 2);
    }
}
