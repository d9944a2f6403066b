//! Error types for process execution, speech, and outbound services.

use std::time::Duration;

use thiserror::Error;

use herald_core::types::StrategyName;

/// An external program could not be run to completion.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{program} not found")]
    NotFound { program: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}{}", describe_code(.code), describe_stderr(.stderr))]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// A single link of the speech chain failed. Recovered by the dispatcher.
#[derive(Error, Debug)]
pub enum StrategyFailure {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("no audio player succeeded (last: {last})")]
    NoPlayer { last: Box<StrategyFailure> },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Error crossing the speech dispatcher boundary.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("nothing to speak: text is empty")]
    EmptyText,

    #[error("all speech methods failed; last was {strategy}: {last}")]
    AllFailed {
        strategy: StrategyName,
        #[source]
        last: StrategyFailure,
    },

    #[error("all speech methods failed")]
    NoStrategies,
}

/// The "open application" launcher failed.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("no application name given")]
    EmptyName,

    #[error("unknown application: {0}")]
    UnknownApp(String),

    #[error("cannot launch on platform {0}")]
    UnsupportedPlatform(String),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// An outbound integration (news, assistant, music) failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} is not configured: missing API key")]
    MissingApiKey(&'static str),

    #[error("nothing to look up: query is empty")]
    EmptyQuery,

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty answer")]
    EmptyResponse(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(String),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}
