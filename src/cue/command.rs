//! External audio player
//!
//! Plays a cue by running `<program> <args...> <file>` and waiting for the
//! process to exit. Decoding and the audio device are the player's business;
//! any failure it reports (non-zero exit) is a fatal cue failure here.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tokio::process::Command as TokioCommand;

use super::{Cue, CuePlayer};

/// Audio file for each cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFiles {
    /// Played when a work period begins
    pub cycle_start: PathBuf,
    /// Played when a work period ends
    pub cycle_end: PathBuf,
    /// Played when a micro-break begins
    pub micro_break_start: PathBuf,
    /// Played when a micro-break ends
    pub micro_break_end: PathBuf,
}

impl CueFiles {
    /// File for `cue`
    #[must_use]
    pub fn path(&self, cue: Cue) -> &Path {
        match cue {
            Cue::CycleStart => &self.cycle_start,
            Cue::CycleEnd => &self.cycle_end,
            Cue::MicroBreakStart => &self.micro_break_start,
            Cue::MicroBreakEnd => &self.micro_break_end,
        }
    }
}

/// Plays cue files through an external program
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    files: CueFiles,
}

impl CommandPlayer {
    /// Create a player, checking that every cue file exists
    pub fn new(program: &str, args: &[String], files: CueFiles) -> Result<Self> {
        if program.trim().is_empty() {
            bail!("Audio player command cannot be empty");
        }
        for cue in Cue::ALL {
            let path = files.path(cue);
            if !path.is_file() {
                bail!("Cue file for '{cue}' not found: {}", path.display());
            }
        }
        Ok(Self {
            program: program.to_string(),
            args: args.to_vec(),
            files,
        })
    }

    /// Build the command that plays `cue`
    #[must_use]
    pub fn build_command(&self, cue: Cue) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.arg(self.files.path(cue));
        cmd
    }
}

impl CuePlayer for CommandPlayer {
    async fn play(&self, cue: Cue) -> Result<()> {
        let path = self.files.path(cue);
        if !path.is_file() {
            bail!("Cue file for '{cue}' not found: {}", path.display());
        }
        run_player(self.build_command(cue))
            .await
            .with_context(|| format!("Failed to play cue '{cue}'"))
    }
}

/// Run a player command to completion.
///
/// Stdout is discarded; stderr is captured and included in the error when
/// the player exits unsuccessfully.
pub async fn run_player(cmd: Command) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut tokio_cmd = TokioCommand::from(cmd);
    tokio_cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio_cmd
        .output()
        .await
        .with_context(|| format!("Failed to spawn audio player '{program}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map_or_else(|| "unknown".to_string(), |c| c.to_string());
        bail!(
            "Audio player '{program}' exited with code {code}: {}",
            stderr.trim()
        );
    }

    Ok(())
}
