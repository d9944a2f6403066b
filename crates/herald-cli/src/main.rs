//! herald CLI — voice command server.
//!
//! ```text
//! herald serve [--port 2004] [--host 127.0.0.1] [--app music=spotify ...]
//! herald speak "hello world" [--server http://localhost:2004]
//! herald command "open calculator" [--server ...]
//! herald status [--server ...]
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use herald_core::types::{ServiceConfig, SpeechConfig};
use herald_lib::server::{AppState, router};

const DEFAULT_SERVER: &str = "http://localhost:2004";

/// herald — voice command server with a speech fallback chain
#[derive(Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the herald server
    Serve(ServeArgs),
    /// Send text to the running server for speech
    Speak {
        /// Text to speak; the server uses a sample sentence when omitted
        text: Option<String>,
        #[arg(long, env = "HERALD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Run a text command ("open calculator", "news", "play jazz", ...)
    Command {
        text: String,
        #[arg(long, env = "HERALD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Get server health and the speech chain
    Status {
        #[arg(long, env = "HERALD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Listen host
    #[arg(long, env = "HERALD_HOST", default_value = "127.0.0.1")]
    host: String,
    /// Listen port
    #[arg(long, env = "HERALD_PORT", default_value = "2004")]
    port: u16,
    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
    /// NewsAPI base URL
    #[arg(long, default_value = "https://newsapi.org")]
    news_url: String,
    /// Headline country code
    #[arg(long, default_value = "us")]
    news_country: String,
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    ai_api_key: Option<String>,
    /// Gemini base URL
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    ai_url: String,
    /// Gemini model name
    #[arg(long, default_value = "gemini-1.5-flash")]
    ai_model: String,
    /// Speech synthesizer invoked directly on Linux
    #[arg(long, default_value = "espeak")]
    synth: String,
    /// Offline renderer used to write audio files on Linux
    #[arg(long, default_value = "pico2wave")]
    renderer: String,
    /// Seconds each speech method may run before the next is tried
    #[arg(long, default_value = "15")]
    strategy_timeout_secs: u64,
    /// Extra app alias, e.g. `--app music=spotify` (repeatable)
    #[arg(long = "app", value_name = "NAME=PROGRAM", value_parser = parse_app)]
    apps: Vec<(String, String)>,
}

impl ServeArgs {
    fn speech_config(&self) -> SpeechConfig {
        SpeechConfig {
            synthesizer: self.synth.clone(),
            renderer: self.renderer.clone(),
            strategy_timeout: Duration::from_secs(self.strategy_timeout_secs),
            ..Default::default()
        }
    }

    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            news_url: self.news_url.clone(),
            news_api_key: self.news_api_key.clone(),
            news_country: self.news_country.clone(),
            ai_url: self.ai_url.clone(),
            ai_api_key: self.ai_api_key.clone(),
            ai_model: self.ai_model.clone(),
            apps: self.apps.iter().cloned().collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }
}

fn parse_app(s: &str) -> Result<(String, String), String> {
    let (name, program) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PROGRAM, got {s:?}"))?;
    let (name, program) = (name.trim(), program.trim());
    if name.is_empty() || program.is_empty() {
        return Err(format!("expected NAME=PROGRAM, got {s:?}"));
    }
    Ok((name.to_string(), program.to_string()))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_lib=info,herald=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,

        Command::Speak { text, server } => {
            let body = match text {
                Some(text) => serde_json::json!({ "text": text }),
                None => serde_json::json!({}),
            };
            let req = reqwest::Client::new()
                .post(format!("{server}/speak"))
                .json(&body);
            print_response(req).await;
        }

        Command::Command { text, server } => {
            let req = reqwest::Client::new()
                .post(format!("{server}/command"))
                .json(&serde_json::json!({ "command": text }));
            print_response(req).await;
        }

        Command::Status { server } => {
            print_response(reqwest::Client::new().get(format!("{server}/health"))).await;
        }
    }
}

async fn serve(args: ServeArgs) {
    let speech = args.speech_config();
    let services = args.service_config();
    info!(
        "herald: platform {}, synthesizer {}, {} app alias(es)",
        speech.platform,
        speech.synthesizer,
        services.apps.len()
    );

    let app = router(Arc::new(AppState::new(speech, services)));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("herald listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}

async fn print_response(req: reqwest::RequestBuilder) {
    match req.send().await {
        Ok(resp) => {
            let failed = !resp.status().is_success();
            println!("{}", resp.text().await.unwrap_or_default());
            if failed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("request failed: {e}");
            std::process::exit(1);
        }
    }
}
