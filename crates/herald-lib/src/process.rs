//! External process invocation — the one primitive every speech strategy and
//! the launcher go through.

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProcessError;

/// Longest stderr excerpt kept in an [`ProcessError::ExitStatus`].
const STDERR_EXCERPT_LEN: usize = 200;

/// A program invocation: argv plus an optional full replacement environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// `Some` replaces the child's environment entirely.
    pub env: Option<BTreeMap<String, String>>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }
}

/// Runs external programs.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion. Non-zero exit is an error.
    async fn run(&self, spec: &CommandSpec) -> Result<(), ProcessError>;

    /// Start the program and return without waiting for it.
    async fn spawn_detached(&self, spec: &CommandSpec) -> Result<(), ProcessError>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::null());
        if let Some(env) = &spec.env {
            cmd.env_clear().envs(env);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
        debug!("process: run {} ({} args)", spec.program, spec.args.len());

        // kill_on_drop: a timed-out attempt drops this future and takes the child with it
        let output = Self::command(spec)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&spec.program, e))?;

        if output.status.success() {
            return Ok(());
        }

        Err(ProcessError::ExitStatus {
            program: spec.program.clone(),
            code: output.status.code(),
            stderr: excerpt(&String::from_utf8_lossy(&output.stderr)),
        })
    }

    async fn spawn_detached(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
        debug!("process: spawn {} detached", spec.program);
        Self::command(spec)
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| spawn_error(&spec.program, e))
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> ProcessError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ProcessError::NotFound {
            program: program.to_string(),
        }
    } else {
        ProcessError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Scripted runner for tests: records every invocation and fails the
/// programs it is told are missing or broken.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        missing: HashSet<String>,
        failing: HashMap<String, i32>,
        pub(crate) calls: Mutex<Vec<CommandSpec>>,
        pub(crate) detached: Mutex<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Every program is reported as not installed.
        pub(crate) fn nothing_installed() -> Self {
            Self::new().missing([
                "espeak", "pico2wave", "say", "powershell", "aplay", "paplay", "ffplay", "afplay",
            ])
        }

        pub(crate) fn missing<'a>(mut self, programs: impl IntoIterator<Item = &'a str>) -> Self {
            self.missing.extend(programs.into_iter().map(String::from));
            self
        }

        pub(crate) fn failing(mut self, program: &str, code: i32) -> Self {
            self.failing.insert(program.to_string(), code);
            self
        }

        pub(crate) fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.clone())
                .collect()
        }

        fn outcome(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
            if self.missing.contains(&spec.program) {
                return Err(ProcessError::NotFound {
                    program: spec.program.clone(),
                });
            }
            if let Some(&code) = self.failing.get(&spec.program) {
                return Err(ProcessError::ExitStatus {
                    program: spec.program.clone(),
                    code: Some(code),
                    stderr: String::new(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
            self.calls.lock().unwrap().push(spec.clone());
            self.outcome(spec)
        }

        async fn spawn_detached(&self, spec: &CommandSpec) -> Result<(), ProcessError> {
            self.detached.lock().unwrap().push(spec.clone());
            self.outcome(spec)
        }
    }
}
