//! Top headlines from a NewsAPI-compatible endpoint.

use serde::Deserialize;
use tracing::debug;

use herald_core::text_prep::strip_source_suffix;
use herald_core::types::ServiceConfig;

use crate::error::ServiceError;

const SERVICE: &str = "news";

#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    country: String,
    limit: usize,
}

#[derive(Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    title: Option<String>,
}

impl NewsClient {
    pub fn new(http: reqwest::Client, config: &ServiceConfig) -> Self {
        Self {
            http,
            base_url: config.news_url.trim_end_matches('/').to_string(),
            api_key: config.news_api_key.clone(),
            country: config.news_country.clone(),
            limit: config.news_limit,
        }
    }

    /// Fetch headline titles, with the trailing source name removed.
    pub async fn headlines(&self) -> Result<Vec<String>, ServiceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingApiKey(SERVICE))?;

        let url = format!("{}/v2/top-headlines", self.base_url);
        let limit = self.limit.to_string();
        debug!("news: GET {url} country={} limit={limit}", self.country);

        let resp = self
            .http
            .get(&url)
            .query(&[("country", self.country.as_str()), ("pageSize", limit.as_str())])
            .header("X-Api-Key", key)
            .header(reqwest::header::USER_AGENT, "herald")
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

        let body: HeadlinesResponse = resp.json().await?;
        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| a.title)
            .map(|t| strip_source_suffix(&t))
            .filter(|t| !t.is_empty())
            .take(self.limit)
            .collect())
    }

    /// Headlines as one spoken sentence.
    pub async fn briefing(&self) -> Result<String, ServiceError> {
        Ok(summarize(&self.headlines().await?))
    }
}

pub fn summarize(titles: &[String]) -> String {
    if titles.is_empty() {
        return "I couldn't find any news right now.".to_string();
    }
    let mut text = String::from("Here are the top headlines.");
    for title in titles {
        text.push(' ');
        text.push_str(title.trim_end_matches('.'));
        text.push('.');
    }
    text
}
