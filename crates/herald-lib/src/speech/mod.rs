//! Speech output — an ordered fallback chain of synthesis strategies.
//!
//! ```text
//! dispatch("text")
//!     → direct           platform synthesizer (espeak / say / System.Speech)
//!     → render-and-play  render to temp WAV, play with aplay / paplay / ffplay
//!     → env-adjusted     direct, with DISPLAY / XDG_RUNTIME_DIR / PULSE_SERVER filled in
//! ```
//!
//! Strategies run strictly one after another; the first to succeed wins and
//! nothing after it runs. Each attempt is bounded by
//! [`SpeechConfig::strategy_timeout`]. A strategy error never escapes the chain:
//! callers see either the winning [`StrategyName`] or a single
//! [`SpeechError::AllFailed`] carrying the last failure.

mod direct;
mod env;
mod render;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use herald_core::text_prep::normalize_whitespace;
use herald_core::types::{DispatchResult, Platform, SpeechConfig, StrategyName};

use crate::error::{SpeechError, StrategyFailure};
use crate::process::{ProcessRunner, SystemRunner};

pub use direct::DirectStrategy;
pub use env::{EnvAdjustedStrategy, session_env};
pub use render::{RenderAndPlayStrategy, TempAudioFile, unique_audio_path};

/// One way of turning text into audible speech.
#[async_trait]
pub trait SpeechStrategy: Send + Sync {
    fn name(&self) -> StrategyName;

    /// Whether this strategy has an implementation for `platform`.
    fn supports(&self, platform: &Platform) -> bool;

    /// Speak `text`, returning once the external program has exited.
    async fn speak(&self, text: &str) -> Result<(), StrategyFailure>;
}

/// Ordered list of strategies folded with early exit on success.
pub struct SpeechDispatcher {
    strategies: Vec<Box<dyn SpeechStrategy>>,
    platform: Platform,
    timeout: Duration,
}

impl SpeechDispatcher {
    /// Default chain running real programs.
    pub fn new(config: SpeechConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Default chain `[direct, render-and-play, env-adjusted]` over `runner`.
    pub fn with_runner(config: SpeechConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let config = Arc::new(config);
        let strategies: Vec<Box<dyn SpeechStrategy>> = vec![
            Box::new(DirectStrategy::new(runner.clone(), config.clone())),
            Box::new(RenderAndPlayStrategy::new(runner.clone(), config.clone())),
            Box::new(EnvAdjustedStrategy::new(runner, config.clone())),
        ];
        Self::with_strategies(config.platform.clone(), config.strategy_timeout, strategies)
    }

    pub fn with_strategies(
        platform: Platform,
        timeout: Duration,
        strategies: Vec<Box<dyn SpeechStrategy>>,
    ) -> Self {
        Self {
            strategies,
            platform,
            timeout,
        }
    }

    pub fn strategy_names(&self) -> Vec<StrategyName> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Speak `text` with the first strategy that succeeds.
    ///
    /// Text that is blank once control characters are flattened is rejected
    /// before any process is spawned.
    pub async fn dispatch(&self, text: &str) -> Result<DispatchResult, SpeechError> {
        if normalize_whitespace(text).is_empty() {
            return Err(SpeechError::EmptyText);
        }

        debug!("speech: dispatching {} chars on {}", text.len(), self.platform);
        let mut last: Option<(StrategyName, StrategyFailure)> = None;

        for strategy in &self.strategies {
            let name = strategy.name();
            info!("speech: trying {name}");

            match self.attempt(strategy.as_ref(), text).await {
                Ok(()) => {
                    info!("speech: spoken via {name}");
                    return Ok(DispatchResult::spoken_by(name));
                }
                Err(e) => {
                    warn!("speech: {name} failed: {e}");
                    last = Some((name, e));
                }
            }
        }

        Err(match last {
            Some((strategy, last)) => SpeechError::AllFailed { strategy, last },
            None => SpeechError::NoStrategies,
        })
    }

    async fn attempt(&self, strategy: &dyn SpeechStrategy, text: &str) -> Result<(), StrategyFailure> {
        if !strategy.supports(&self.platform) {
            return Err(StrategyFailure::UnsupportedPlatform(self.platform.to_string()));
        }
        tokio::time::timeout(self.timeout, strategy.speak(text))
            .await
            .unwrap_or_else(|_| Err(StrategyFailure::Timeout(self.timeout)))
    }
}

/// Platforms the built-in strategies know how to drive.
fn is_known_platform(platform: &Platform) -> bool {
    !matches!(platform, Platform::Other(_))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ProcessError;
    use crate::process::testing::ScriptedRunner;

    /// Strategy with a fixed outcome that logs its invocations.
    struct Scripted {
        name: StrategyName,
        fail_with: Option<&'static str>,
        delay: Option<Duration>,
        log: Arc<Mutex<Vec<StrategyName>>>,
    }

    #[async_trait]
    impl SpeechStrategy for Scripted {
        fn name(&self) -> StrategyName {
            self.name
        }

        fn supports(&self, _platform: &Platform) -> bool {
            true
        }

        async fn speak(&self, _text: &str) -> Result<(), StrategyFailure> {
            self.log.lock().unwrap().push(self.name);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_with {
                Some(program) => Err(ProcessError::NotFound {
                    program: program.into(),
                }
                .into()),
                None => Ok(()),
            }
        }
    }

    fn chain(
        outcomes: [Option<&'static str>; 3],
    ) -> (SpeechDispatcher, Arc<Mutex<Vec<StrategyName>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let strategies = StrategyName::ALL
            .into_iter()
            .zip(outcomes)
            .map(|(name, fail_with)| {
                Box::new(Scripted {
                    name,
                    fail_with,
                    delay: None,
                    log: log.clone(),
                }) as Box<dyn SpeechStrategy>
            })
            .collect();
        let dispatcher =
            SpeechDispatcher::with_strategies(Platform::Linux, Duration::from_secs(5), strategies);
        (dispatcher, log)
    }

    fn linux_config(dir: &std::path::Path) -> SpeechConfig {
        SpeechConfig {
            platform: Platform::Linux,
            temp_dir: dir.to_path_buf(),
            cleanup_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let (dispatcher, log) = chain([None, None, None]);
        let result = dispatcher.dispatch("Hello").await.unwrap();
        assert!(result.success);
        assert_eq!(result.strategy, StrategyName::Direct);
        assert_eq!(*log.lock().unwrap(), vec![StrategyName::Direct]);
    }

    #[tokio::test]
    async fn second_strategy_wins_after_first_fails() {
        let (dispatcher, log) = chain([Some("espeak"), None, None]);
        let result = dispatcher.dispatch("Hello").await.unwrap();
        assert_eq!(result.strategy, StrategyName::RenderAndPlay);
        assert_eq!(
            *log.lock().unwrap(),
            vec![StrategyName::Direct, StrategyName::RenderAndPlay]
        );
    }

    #[tokio::test]
    async fn all_failed_carries_last_reason() {
        let (dispatcher, log) = chain([Some("first"), Some("second"), Some("third")]);
        match dispatcher.dispatch("Hello").await.unwrap_err() {
            SpeechError::AllFailed { strategy, last } => {
                assert_eq!(strategy, StrategyName::EnvAdjusted);
                assert_eq!(last.to_string(), "third not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_running_anything() {
        let (dispatcher, log) = chain([None, None, None]);
        assert!(matches!(dispatcher.dispatch("").await, Err(SpeechError::EmptyText)));
        assert!(matches!(dispatcher.dispatch(" \n\t").await, Err(SpeechError::EmptyText)));
        assert!(matches!(dispatcher.dispatch("\0\u{7}").await, Err(SpeechError::EmptyText)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_chain_reports_generic_failure() {
        let dispatcher = SpeechDispatcher::with_strategies(Platform::Linux, Duration::from_secs(1), vec![]);
        let err = dispatcher.dispatch("Hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::NoStrategies));
        assert_eq!(err.to_string(), "all speech methods failed");
    }

    #[tokio::test]
    async fn hung_strategy_times_out_and_chain_advances() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hung = Scripted {
            name: StrategyName::Direct,
            fail_with: None,
            delay: Some(Duration::from_secs(3600)),
            log: log.clone(),
        };
        let quick = Scripted {
            name: StrategyName::RenderAndPlay,
            fail_with: None,
            delay: None,
            log: log.clone(),
        };
        let strategies: Vec<Box<dyn SpeechStrategy>> = vec![Box::new(hung), Box::new(quick)];
        let dispatcher =
            SpeechDispatcher::with_strategies(Platform::Linux, Duration::from_millis(50), strategies);
        let result = dispatcher.dispatch("Hello").await.unwrap();
        assert_eq!(result.strategy, StrategyName::RenderAndPlay);
        assert_eq!(
            *log.lock().unwrap(),
            vec![StrategyName::Direct, StrategyName::RenderAndPlay]
        );
    }

    #[tokio::test]
    async fn default_chain_order() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher =
            SpeechDispatcher::with_runner(linux_config(dir.path()), Arc::new(ScriptedRunner::new()));
        assert_eq!(dispatcher.strategy_names(), StrategyName::ALL.to_vec());
    }

    #[tokio::test]
    async fn primary_synth_absent_falls_back_to_render_and_play() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().missing(["espeak"]));
        let dispatcher = SpeechDispatcher::with_runner(linux_config(dir.path()), runner.clone());

        let result = dispatcher.dispatch("Hello").await.unwrap();
        assert_eq!(result.strategy, StrategyName::RenderAndPlay);
        assert_eq!(runner.programs(), vec!["espeak", "pico2wave", "aplay"]);
    }

    #[tokio::test]
    async fn nothing_installed_reports_env_adjusted_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = SpeechDispatcher::with_runner(
            linux_config(dir.path()),
            Arc::new(ScriptedRunner::nothing_installed()),
        );
        let err = dispatcher.dispatch("Hello").await.unwrap_err();
        assert!(matches!(
            err,
            SpeechError::AllFailed {
                strategy: StrategyName::EnvAdjusted,
                ..
            }
        ));
        assert!(err.to_string().contains("env-adjusted"), "{err}");
    }

    #[tokio::test]
    async fn unknown_platform_fails_every_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let config = SpeechConfig {
            platform: Platform::Other("plan9".into()),
            ..linux_config(dir.path())
        };
        let runner = Arc::new(ScriptedRunner::new());
        let dispatcher = SpeechDispatcher::with_runner(config, runner.clone());
        match dispatcher.dispatch("Hello").await.unwrap_err() {
            SpeechError::AllFailed { last, .. } => {
                assert!(matches!(last, StrategyFailure::UnsupportedPlatform(os) if os == "plan9"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(runner.programs().is_empty());
    }
}
