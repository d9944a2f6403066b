//! Direct synthesis with an explicit session environment, for service and
//! headless contexts that start without display or audio-session variables.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use herald_core::types::{Platform, SpeechConfig, StrategyName};

use super::direct::speak_command;
use super::{SpeechStrategy, is_known_platform};
use crate::error::StrategyFailure;
use crate::process::ProcessRunner;

pub struct EnvAdjustedStrategy {
    runner: Arc<dyn ProcessRunner>,
    config: Arc<SpeechConfig>,
}

impl EnvAdjustedStrategy {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: Arc<SpeechConfig>) -> Self {
        Self { runner, config }
    }
}

#[async_trait]
impl SpeechStrategy for EnvAdjustedStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::EnvAdjusted
    }

    fn supports(&self, platform: &Platform) -> bool {
        is_known_platform(platform)
    }

    async fn speak(&self, text: &str) -> Result<(), StrategyFailure> {
        let spec = speak_command(&self.config, text)?
            .with_env(session_env(ambient_env(), self.config.session_uid));
        self.runner.run(&spec).await?;
        Ok(())
    }
}

/// The ambient environment with `DISPLAY`, `XDG_RUNTIME_DIR` and
/// `PULSE_SERVER` filled in wherever they are missing or empty.
pub fn session_env<I>(ambient: I, uid: u32) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = ambient.into_iter().collect();
    fill_default(&mut env, "DISPLAY", ":0".to_string());
    let runtime_dir = fill_default(&mut env, "XDG_RUNTIME_DIR", format!("/run/user/{uid}"));
    fill_default(&mut env, "PULSE_SERVER", format!("unix:{runtime_dir}/pulse/native"));
    env
}

/// Process environment, skipping entries that are not valid UTF-8.
fn ambient_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn fill_default(env: &mut BTreeMap<String, String>, key: &str, default: String) -> String {
    let value = env.entry(key.to_string()).or_default();
    if value.is_empty() {
        *value = default;
    }
    value.clone()
}
