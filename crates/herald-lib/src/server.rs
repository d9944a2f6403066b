//! HTTP API for the herald voice command server.
//!
//! Runs on port 2004 by default. CORS-permissive so a browser front end on
//! another local port can call it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use herald_core::text_prep::normalize_whitespace;
use herald_core::types::{
    ActionResponse, CommandRequest, CommandResponse, ErrorResponse, Platform, SAMPLE_SPEECH,
    ServiceConfig, SpeakRequest, SpeakResponse, SpeechConfig, StrategyName,
};

use crate::assistant::AssistantClient;
use crate::command::CommandService;
use crate::error::{LaunchError, ServiceError, SpeechError};
use crate::launcher::Launcher;
use crate::music::MusicService;
use crate::news::NewsClient;
use crate::process::{ProcessRunner, SystemRunner};
use crate::speech::SpeechDispatcher;

/// Everything the handlers share. Read-only after construction.
pub struct AppState {
    pub speech: SpeechDispatcher,
    pub commands: CommandService,
    platform: Platform,
}

impl AppState {
    pub fn new(speech: SpeechConfig, services: ServiceConfig) -> Self {
        Self::with_runner(Arc::new(SystemRunner), speech, services)
    }

    pub fn with_runner(
        runner: Arc<dyn ProcessRunner>,
        speech: SpeechConfig,
        services: ServiceConfig,
    ) -> Self {
        let platform = speech.platform.clone();
        let http = reqwest::Client::new();
        let launcher = Arc::new(Launcher::new(
            runner.clone(),
            platform.clone(),
            services.apps.clone(),
        ));
        let commands = CommandService {
            launcher: launcher.clone(),
            news: NewsClient::new(http.clone(), &services),
            assistant: AssistantClient::new(http, &services),
            music: MusicService::new(launcher),
        };
        Self {
            speech: SpeechDispatcher::with_runner(speech, runner),
            commands,
            platform,
        }
    }
}

/// Build the axum router with shared [`AppState`].
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/speak", post(speak))
        .route("/command", post(command))
        .route("/open-app", post(open_app))
        .route("/news", get(news))
        .route("/ask", post(ask))
        .route("/music", post(music))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request / response types ──────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct OpenAppRequest {
    app: String,
}

#[derive(serde::Deserialize)]
struct AskRequest {
    prompt: String,
}

#[derive(serde::Deserialize)]
struct MusicRequest {
    query: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    platform: String,
    strategies: Vec<StrategyName>,
}

// ─── Errors ────────────────────────────────────────────────────────────────

enum ApiError {
    Speech(SpeechError),
    Service(ServiceError),
    /// The command ran but its reply could not be spoken.
    Unspoken {
        response: String,
        source: SpeechError,
    },
}

impl From<SpeechError> for ApiError {
    fn from(e: SpeechError) -> Self {
        ApiError::Speech(e)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<LaunchError> for ApiError {
    fn from(e: LaunchError) -> Self {
        ApiError::Service(e.into())
    }
}

fn speech_status(e: &SpeechError) -> StatusCode {
    match e {
        SpeechError::EmptyText => StatusCode::BAD_REQUEST,
        SpeechError::AllFailed { .. } | SpeechError::NoStrategies => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn service_status(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::EmptyQuery => StatusCode::BAD_REQUEST,
        ServiceError::Upstream { .. } | ServiceError::EmptyResponse(_) | ServiceError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        ServiceError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Launch(e) => match e {
            LaunchError::EmptyName => StatusCode::BAD_REQUEST,
            LaunchError::UnknownApp(_) => StatusCode::NOT_FOUND,
            LaunchError::UnsupportedPlatform(_) => StatusCode::NOT_IMPLEMENTED,
            LaunchError::Process(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, response) = match self {
            ApiError::Speech(e) => (speech_status(&e), e.to_string(), None),
            ApiError::Service(e) => (service_status(&e), e.to_string(), None),
            ApiError::Unspoken { response, source } => {
                (speech_status(&source), source.to_string(), Some(response))
            }
        };
        if status.is_server_error() {
            error!("request failed ({status}): {error}");
        }
        let body = ErrorResponse {
            ok: false,
            error,
            response,
        };
        (status, Json(body)).into_response()
    }
}

// ─── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        platform: state.platform.to_string(),
        strategies: state.speech.strategy_names(),
    })
}

async fn speak(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SpeakRequest>>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let text = body
        .and_then(|Json(req)| req.text)
        .filter(|t| !normalize_whitespace(t).is_empty())
        .unwrap_or_else(|| SAMPLE_SPEECH.to_string());
    info!("speak: {} chars", text.len());

    let result = state.speech.dispatch(&text).await?;
    Ok(Json(SpeakResponse {
        ok: result.success,
        strategy: result.strategy,
    }))
}

async fn command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    info!("command: {:?}", req.command);
    let reply = state.commands.execute(&req.command).await?;

    match state.speech.dispatch(&reply.response).await {
        Ok(result) => Ok(Json(CommandResponse {
            ok: true,
            intent: reply.intent.kind(),
            response: reply.response,
            strategy: result.strategy,
            link: reply.link,
        })),
        Err(source) => Err(ApiError::Unspoken {
            response: reply.response,
            source,
        }),
    }
}

async fn open_app(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenAppRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let response = state.commands.launcher.open_app(&req.app).await?;
    Ok(Json(ActionResponse {
        ok: true,
        response,
        link: None,
    }))
}

async fn news(State(state): State<Arc<AppState>>) -> Result<Json<ActionResponse>, ApiError> {
    let response = state.commands.news.briefing().await?;
    Ok(Json(ActionResponse {
        ok: true,
        response,
        link: None,
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let response = state.commands.assistant.ask(&req.prompt).await?;
    Ok(Json(ActionResponse {
        ok: true,
        response,
        link: None,
    }))
}

async fn music(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MusicRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let reply = state.commands.music.play(&req.query).await?;
    Ok(Json(ActionResponse {
        ok: true,
        response: reply.response,
        link: Some(reply.link),
    }))
}
