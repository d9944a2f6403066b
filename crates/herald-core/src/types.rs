//! Shared types for the herald voice command server.
//!
//! Used by herald-lib and herald-cli. Keeping them here means the CLI and any
//! downstream client can depend on the wire types without tokio or axum.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── Speech types ──────────────────────────────────────────────────────────

/// Name of one link in the speech fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    /// Platform synthesizer invoked directly.
    Direct,
    /// Offline render to a temp file, then play it.
    RenderAndPlay,
    /// Direct invocation with session variables injected into the environment.
    EnvAdjusted,
}

impl StrategyName {
    pub const ALL: [StrategyName; 3] = [
        StrategyName::Direct,
        StrategyName::RenderAndPlay,
        StrategyName::EnvAdjusted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyName::Direct => "direct",
            StrategyName::RenderAndPlay => "render-and-play",
            StrategyName::EnvAdjusted => "env-adjusted",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of a dispatch: which strategy produced the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub strategy: StrategyName,
}

impl DispatchResult {
    pub fn spoken_by(strategy: StrategyName) -> Self {
        Self {
            success: true,
            strategy,
        }
    }
}

/// Operating system family the process is running on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Windows => f.write_str("windows"),
            Platform::Other(os) => f.write_str(os),
        }
    }
}

/// Speech dispatcher configuration.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub platform: Platform,
    /// Command-line synthesizer used on Linux (`espeak`, `espeak-ng`, ...).
    pub synthesizer: String,
    /// Offline renderer used on Linux; must accept `-w <file> <text>`.
    pub renderer: String,
    /// Upper bound for a single strategy attempt.
    pub strategy_timeout: Duration,
    /// Directory for rendered audio files.
    pub temp_dir: PathBuf,
    /// How long a rendered file survives after playback.
    pub cleanup_delay: Duration,
    /// Uid used to build default `XDG_RUNTIME_DIR` for headless sessions.
    pub session_uid: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            synthesizer: "espeak".into(),
            renderer: "pico2wave".into(),
            strategy_timeout: Duration::from_secs(15),
            temp_dir: std::env::temp_dir(),
            cleanup_delay: Duration::from_secs(1),
            session_uid: 1000,
        }
    }
}

// ─── Server types ──────────────────────────────────────────────────────────

/// Endpoints and keys for the outbound integrations.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub news_url: String,
    pub news_api_key: Option<String>,
    pub news_country: String,
    pub news_limit: usize,
    pub ai_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    /// Extra launcher aliases: spoken name → program.
    pub apps: BTreeMap<String, String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            news_url: "https://newsapi.org".into(),
            news_api_key: None,
            news_country: "us".into(),
            news_limit: 5,
            ai_url: "https://generativelanguage.googleapis.com".into(),
            ai_api_key: None,
            ai_model: "gemini-1.5-flash".into(),
            apps: BTreeMap::new(),
        }
    }
}

/// Text spoken by `/speak` when the request carries none.
pub const SAMPLE_SPEECH: &str = "Hello, this is Herald speaking.";

/// What a text command resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Intent {
    OpenApp(String),
    News,
    Music(String),
    Ask(String),
    Empty,
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::OpenApp(_) => "open_app",
            Intent::News => "news",
            Intent::Music(_) => "music",
            Intent::Ask(_) => "ask",
            Intent::Empty => "empty",
        }
    }
}

// ─── Wire payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakResponse {
    pub ok: bool,
    pub strategy: StrategyName,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub ok: bool,
    pub intent: &'static str,
    pub response: String,
    pub strategy: StrategyName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Reply from a route that performs an action without speaking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}
