//! Text command resolution — turns a short phrase into an [`Intent`] and
//! runs it against the matching collaborator.

use std::sync::Arc;

use tracing::info;

use herald_core::types::Intent;

use crate::assistant::AssistantClient;
use crate::error::ServiceError;
use crate::launcher::Launcher;
use crate::music::MusicService;
use crate::news::NewsClient;

const WAKE_WORDS: &[&str] = &["hey herald", "ok herald", "herald"];
const OPEN_VERBS: &[&str] = &["open", "launch", "start"];
const NEWS_WORDS: &[&str] = &["news", "headlines"];

/// Resolve a command phrase. Case-insensitive; a leading wake word is ignored.
pub fn resolve(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    let phrase = strip_wake_word(&lower);
    if phrase.is_empty() {
        return Intent::Empty;
    }

    let (verb, rest) = match phrase.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (phrase, ""),
    };

    if OPEN_VERBS.contains(&verb) && !rest.is_empty() {
        return Intent::OpenApp(rest.to_string());
    }
    if verb == "play" && !rest.is_empty() {
        return Intent::Music(rest.to_string());
    }
    if phrase
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| NEWS_WORDS.contains(&w))
    {
        return Intent::News;
    }
    Intent::Ask(phrase.to_string())
}

fn strip_wake_word(phrase: &str) -> &str {
    for wake in WAKE_WORDS {
        if let Some(rest) = phrase.strip_prefix(wake) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ',') {
                return rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            }
        }
    }
    phrase
}

/// Result of running a command: what to say and, for music, what was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub intent: Intent,
    pub response: String,
    pub link: Option<String>,
}

/// Dispatches resolved intents to the launcher, news, assistant, and music.
#[derive(Clone)]
pub struct CommandService {
    pub launcher: Arc<Launcher>,
    pub news: NewsClient,
    pub assistant: AssistantClient,
    pub music: MusicService,
}

impl CommandService {
    pub async fn execute(&self, text: &str) -> Result<CommandReply, ServiceError> {
        let intent = resolve(text);
        info!("command: resolved to {}", intent.kind());

        let (response, link) = match &intent {
            Intent::OpenApp(app) => (self.launcher.open_app(app).await?, None),
            Intent::News => (self.news.briefing().await?, None),
            Intent::Music(query) => {
                let reply = self.music.play(query).await?;
                (reply.response, Some(reply.link))
            }
            Intent::Ask(prompt) => (self.assistant.ask(prompt).await?, None),
            Intent::Empty => return Err(ServiceError::EmptyQuery),
        };

        Ok(CommandReply {
            intent,
            response,
            link,
        })
    }
}
