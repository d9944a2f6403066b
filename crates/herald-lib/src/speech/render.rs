//! Render-and-play: synthesize to a temp audio file offline, then hand the
//! file to a platform player.
//!
//! The file is owned by a [`TempAudioFile`] guard from before rendering starts,
//! so every exit path (render error, player error, success, timeout drop)
//! schedules its deletion. Deletion is best-effort and never feeds back into
//! the strategy outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, warn};

use herald_core::text_prep::{normalize_whitespace, powershell_literal};
use herald_core::types::{Platform, SpeechConfig, StrategyName};

use super::direct::powershell;
use super::{SpeechStrategy, is_known_platform};
use crate::error::StrategyFailure;
use crate::process::{CommandSpec, ProcessRunner};

/// Distinguishes files created within the same clock tick.
static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct RenderAndPlayStrategy {
    runner: Arc<dyn ProcessRunner>,
    config: Arc<SpeechConfig>,
}

impl RenderAndPlayStrategy {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: Arc<SpeechConfig>) -> Self {
        Self { runner, config }
    }

    async fn play(&self, file: &Path) -> Result<(), StrategyFailure> {
        let mut last = None;
        for player in player_commands(&self.config.platform, file)? {
            debug!("render: playing with {}", player.program);
            match self.runner.run(&player).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("render: {} failed: {e}", player.program);
                    last = Some(e);
                }
            }
        }
        match last {
            Some(e) => Err(StrategyFailure::NoPlayer {
                last: Box::new(e.into()),
            }),
            None => Err(StrategyFailure::UnsupportedPlatform(self.config.platform.to_string())),
        }
    }
}

#[async_trait]
impl SpeechStrategy for RenderAndPlayStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::RenderAndPlay
    }

    fn supports(&self, platform: &Platform) -> bool {
        is_known_platform(platform)
    }

    async fn speak(&self, text: &str) -> Result<(), StrategyFailure> {
        let extension = match self.config.platform {
            Platform::MacOs => "aiff",
            _ => "wav",
        };
        let audio = TempAudioFile::new(
            unique_audio_path(&self.config.temp_dir, extension),
            self.config.cleanup_delay,
        );

        let render = render_command(&self.config, text, audio.path())?;
        debug!("render: {} → {}", render.program, audio.path().display());
        self.runner.run(&render).await?;

        self.play(audio.path()).await
    }
}

/// A path in the temp directory unique across processes and rapid calls:
/// pid, wall-clock nanoseconds, and a process-wide counter.
pub fn unique_audio_path(dir: &Path, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "herald-speech-{}-{nanos}-{seq}.{extension}",
        std::process::id()
    ))
}

fn render_command(config: &SpeechConfig, text: &str, file: &Path) -> Result<CommandSpec, StrategyFailure> {
    let text = normalize_whitespace(text);
    let file = file.to_string_lossy().into_owned();
    match &config.platform {
        Platform::Linux => {
            Ok(CommandSpec::new(&config.renderer).args(["-w", file.as_str(), "--", text.as_str()]))
        }
        Platform::MacOs => Ok(CommandSpec::new("say").args(["-o", file.as_str(), "--", text.as_str()])),
        Platform::Windows => Ok(powershell(&format!(
            "Add-Type -AssemblyName System.Speech; \
             $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $s.SetOutputToWaveFile('{}'); $s.Speak('{}'); $s.Dispose()",
            powershell_literal(&file),
            powershell_literal(&text)
        ))),
        Platform::Other(os) => Err(StrategyFailure::UnsupportedPlatform(os.clone())),
    }
}

/// Candidate players, in the order they are tried.
fn player_commands(platform: &Platform, file: &Path) -> Result<Vec<CommandSpec>, StrategyFailure> {
    let file = file.to_string_lossy().into_owned();
    match platform {
        Platform::Linux => Ok(vec![
            CommandSpec::new("aplay").args(["-q", file.as_str()]),
            CommandSpec::new("paplay").arg(file.as_str()),
            CommandSpec::new("ffplay").args(["-nodisp", "-autoexit", "-loglevel", "quiet", file.as_str()]),
        ]),
        Platform::MacOs => Ok(vec![CommandSpec::new("afplay").arg(file.as_str())]),
        Platform::Windows => Ok(vec![powershell(&format!(
            "(New-Object Media.SoundPlayer '{}').PlaySync()",
            powershell_literal(&file)
        ))]),
        Platform::Other(os) => Err(StrategyFailure::UnsupportedPlatform(os.clone())),
    }
}

/// Scoped ownership of a rendered audio file.
///
/// Dropping the guard schedules removal after `delay` on the current tokio
/// runtime, or removes immediately when there is none.
#[derive(Debug)]
pub struct TempAudioFile {
    path: PathBuf,
    delay: Duration,
}

impl TempAudioFile {
    pub fn new(path: PathBuf, delay: Duration) -> Self {
        Self { path, delay }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        let delay = self.delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    report_removal(&path, tokio::fs::remove_file(&path).await);
                });
            }
            Err(_) => report_removal(&path, std::fs::remove_file(&path)),
        }
    }
}

fn report_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!("render: removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("render: {} already gone", path.display())
        }
        Err(e) => warn!("render: could not remove {}: {e}", path.display()),
    }
}
