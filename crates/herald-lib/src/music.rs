//! Music search — builds a YouTube search link and opens it.

use std::sync::Arc;

use reqwest::Url;

use crate::error::ServiceError;
use crate::launcher::Launcher;

const SEARCH_URL: &str = "https://www.youtube.com/results";

/// Search link for `query`, URL-encoded as a `search_query` parameter.
pub fn search_link(query: &str) -> Result<String, ServiceError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServiceError::EmptyQuery);
    }
    Url::parse_with_params(SEARCH_URL, &[("search_query", query)])
        .map(String::from)
        .map_err(|e| ServiceError::Url(e.to_string()))
}

/// A played track: spoken reply plus the link that was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicReply {
    pub response: String,
    pub link: String,
}

#[derive(Clone)]
pub struct MusicService {
    launcher: Arc<Launcher>,
}

impl MusicService {
    pub fn new(launcher: Arc<Launcher>) -> Self {
        Self { launcher }
    }

    pub async fn play(&self, query: &str) -> Result<MusicReply, ServiceError> {
        let link = search_link(query)?;
        self.launcher.open_url(&link).await?;
        Ok(MusicReply {
            response: format!("Playing {}", query.trim()),
            link,
        })
    }
}
