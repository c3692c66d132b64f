//! Unsplash photo search client
//!
//! Looks up a representative photo for the detected species' common name.
//! Best-effort enrichment for the secondary channel only.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const USER_AGENT: &str = "birdnotify/0.1.0";
const LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Unsplash client errors
#[derive(Debug, Error)]
pub enum UnsplashError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    small: Option<String>,
}

/// Unsplash photo search client
pub struct UnsplashClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl UnsplashClient {
    pub fn new(api_key: String) -> Result<Self, UnsplashError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .map_err(|e| UnsplashError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// URL of the first photo matching `query`, if any.
    pub async fn first_photo_url(&self, query: &str) -> Result<Option<String>, UnsplashError> {
        let response = self
            .http_client
            .get(UNSPLASH_SEARCH_URL)
            .header("Authorization", format!("Client-ID {}", self.api_key))
            .query(&[("query", query), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| UnsplashError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UnsplashError::Api(status.as_u16(), body));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| UnsplashError::Parse(e.to_string()))?;

        Ok(search.results.into_iter().next().and_then(|r| r.urls.small))
    }
}
