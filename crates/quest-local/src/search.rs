//! HTML search provider: one GET per query against a Google-style result
//! page. The crawler mines the returned document for result links.

use quest_core::{Error, Result, SearchProvider};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://www.google.com/search";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

fn endpoint_from_env() -> Option<String> {
    std::env::var("QUEST_SEARCH_ENDPOINT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct WebSearchProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearchProvider {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    /// Endpoint from `QUEST_SEARCH_ENDPOINT` when set (tests, self-hosted
    /// frontends), otherwise the default web search.
    pub fn from_env(client: reqwest::Client) -> Self {
        let endpoint = endpoint_from_env().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self::new(client, endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SearchProvider for WebSearchProvider {
    fn name(&self) -> &'static str {
        "web-html"
    }

    async fn search(&self, query: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let status = resp.status();
        // Rate limiting gets its own variant so the caller can show the
        // IP-throttled hint instead of a generic connectivity warning.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::Search(format!("search HTTP {status}")));
        }

        resp.text().await.map_err(|e| Error::Search(e.to_string()))
    }
}
