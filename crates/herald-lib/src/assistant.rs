//! Generative-AI text endpoint (Gemini `generateContent` REST shape).

use serde::Deserialize;
use tracing::debug;

use herald_core::text_prep::clean_text_for_speech;
use herald_core::types::ServiceConfig;

use crate::error::ServiceError;

const SERVICE: &str = "assistant";

/// Keeps answers short enough to listen to.
const MAX_OUTPUT_TOKENS: u32 = 256;

#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl AssistantClient {
    pub fn new(http: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            http,
            base_url: config.ai_url.trim_end_matches('/').to_string(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        }
    }

    /// Ask the model and return its answer cleaned for speech.
    pub async fn ask(&self, prompt: &str) -> Result<String, ServiceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ServiceError::EmptyQuery);
        }
        let key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingApiKey(SERVICE))?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "maxOutputTokens": MAX_OUTPUT_TOKENS },
        });

        debug!("assistant: POST {} chars to {}", prompt.len(), self.model);

        let resp = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream {
                service: SERVICE,
                status,
                body,
            });
        }

        let answer = first_answer(resp.json().await?);
        let answer = clean_text_for_speech(&answer);
        if answer.is_empty() {
            return Err(ServiceError::EmptyResponse(SERVICE));
        }
        Ok(answer)
    }
}

fn first_answer(resp: GenerateResponse) -> String {
    resp.candidates
        .into_iter()
        .find_map(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
