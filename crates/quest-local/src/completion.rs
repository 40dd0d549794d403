//! OpenAI-compatible legacy completions client.
//!
//! The chat loop talks to `/v1/completions` because the prompt is a single
//! assembled string with its own speaker structure and stop sequence.

use quest_core::{CompletionBackend, CompletionRequest, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
    /// `api_key` comes from the caller's credential flow; base URL and model
    /// are overridable via `QUEST_OPENAI_BASE_URL` / `QUEST_OPENAI_MODEL`.
    pub fn from_env(client: reqwest::Client, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::NotConfigured("empty API key".to_string()));
        }
        Ok(Self {
            client,
            base_url: env("QUEST_OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: env("QUEST_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_completions(&self) -> String {
        format!("{}/v1/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl CompletionBackend for OpenAiCompletionClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let body = CompletionsRequest {
            model: self.model.clone(),
            prompt: req.prompt.clone(),
            max_tokens: req.max_tokens as u64,
            n: 1,
            stop: req.stop.clone(),
            temperature: req.temperature,
        };

        let resp = self
            .client
            .post(self.endpoint_completions())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .timeout(COMPLETION_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Llm(format!("completions HTTP {status}")));
        }

        let parsed: CompletionsResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        Ok(parsed
            .choices
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize)]
struct CompletionsRequest {
    model: String,
    prompt: String,
    max_tokens: u64,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<String>,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    text: String,
}
