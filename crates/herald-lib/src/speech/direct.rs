//! Direct platform synthesis: `espeak` on Linux, `say` on macOS,
//! System.Speech through PowerShell on Windows.

use std::sync::Arc;

use async_trait::async_trait;

use herald_core::text_prep::{normalize_whitespace, powershell_literal};
use herald_core::types::{Platform, SpeechConfig, StrategyName};

use super::{SpeechStrategy, is_known_platform};
use crate::error::StrategyFailure;
use crate::process::{CommandSpec, ProcessRunner};

pub struct DirectStrategy {
    runner: Arc<dyn ProcessRunner>,
    config: Arc<SpeechConfig>,
}

impl DirectStrategy {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: Arc<SpeechConfig>) -> Self {
        Self { runner, config }
    }
}

#[async_trait]
impl SpeechStrategy for DirectStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Direct
    }

    fn supports(&self, platform: &Platform) -> bool {
        is_known_platform(platform)
    }

    async fn speak(&self, text: &str) -> Result<(), StrategyFailure> {
        let spec = speak_command(&self.config, text)?;
        self.runner.run(&spec).await?;
        Ok(())
    }
}

/// Build the synthesizer invocation for the configured platform.
///
/// Shared with the env-adjusted strategy, which only swaps the environment.
pub(super) fn speak_command(config: &SpeechConfig, text: &str) -> Result<CommandSpec, StrategyFailure> {
    let text = normalize_whitespace(text);
    match &config.platform {
        Platform::Linux => Ok(CommandSpec::new(&config.synthesizer).args(["--", text.as_str()])),
        Platform::MacOs => Ok(CommandSpec::new("say").args(["--", text.as_str()])),
        Platform::Windows => Ok(powershell(&format!(
            "Add-Type -AssemblyName System.Speech; \
             (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{}')",
            powershell_literal(&text)
        ))),
        Platform::Other(os) => Err(StrategyFailure::UnsupportedPlatform(os.clone())),
    }
}

pub(super) fn powershell(script: &str) -> CommandSpec {
    CommandSpec::new("powershell").args(["-NoProfile", "-NonInteractive", "-Command", script])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    fn config(platform: Platform) -> SpeechConfig {
        SpeechConfig {
            platform,
            ..Default::default()
        }
    }

    #[test]
    fn linux_uses_configured_synthesizer() {
        let cfg = SpeechConfig {
            synthesizer: "espeak-ng".into(),
            ..config(Platform::Linux)
        };
        let spec = speak_command(&cfg, "Hello there").unwrap();
        assert_eq!(spec.program, "espeak-ng");
        assert_eq!(spec.args, vec!["--", "Hello there"]);
        assert!(spec.env.is_none());
    }

    #[test]
    fn quotes_travel_as_one_argument() {
        let spec = speak_command(&config(Platform::MacOs), r#"She said "it's fine""#).unwrap();
        assert_eq!(spec.program, "say");
        assert_eq!(spec.args, vec!["--", r#"She said "it's fine""#]);
    }

    #[test]
    fn windows_script_neutralizes_quotes() {
        let spec = speak_command(&config(Platform::Windows), r#"it's "done""#).unwrap();
        assert_eq!(spec.program, "powershell");
        let script = spec.args.last().unwrap();
        assert!(script.contains(".Speak('it''s done')"), "{script}");
        assert!(!script.contains('"'));
    }

    #[test]
    fn leading_dash_is_not_an_option() {
        for platform in [Platform::Linux, Platform::MacOs] {
            let spec = speak_command(&config(platform), "-w/tmp/x").unwrap();
            assert_eq!(spec.args, vec!["--", "-w/tmp/x"]);
        }
    }

    #[test]
    fn windows_script_neutralizes_curly_quotes() {
        let spec = speak_command(&config(Platform::Windows), "it\u{2019}); calc; (\u{2019}").unwrap();
        let script = spec.args.last().unwrap();
        assert!(
            script.contains(".Speak('it\u{2019}\u{2019}); calc; (\u{2019}\u{2019}')"),
            "{script}"
        );
    }

    #[test]
    fn newlines_are_flattened() {
        let spec = speak_command(&config(Platform::Linux), "line one\nline two").unwrap();
        assert_eq!(spec.args, vec!["--", "line one line two"]);
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = speak_command(&config(Platform::Other("haiku".into())), "hi").unwrap_err();
        assert!(matches!(err, StrategyFailure::UnsupportedPlatform(os) if os == "haiku"));
    }

    #[tokio::test]
    async fn speaks_through_runner() {
        let runner = Arc::new(ScriptedRunner::new());
        let strategy = DirectStrategy::new(runner.clone(), Arc::new(config(Platform::Linux)));
        strategy.speak("Hello").await.unwrap();
        assert_eq!(runner.programs(), vec!["espeak"]);
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let runner = Arc::new(ScriptedRunner::new().failing("espeak", 1));
        let strategy = DirectStrategy::new(runner, Arc::new(config(Platform::Linux)));
        let err = strategy.speak("Hello").await.unwrap_err();
        assert_eq!(err.to_string(), "espeak exited with status 1");
    }
}
