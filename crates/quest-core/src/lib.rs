use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod conversation;
pub mod persona;
pub mod prompt;
pub mod store;

pub use conversation::{Conversation, Speaker, Turn};
pub use persona::{Persona, PersonaProfile};
pub use prompt::{build_prompt, AssembledPrompt, HeuristicTokenCounter, PromptInput, TokenCounter};
pub use store::{SnippetRecord, SnippetStore};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("search rate limited (HTTP 429)")]
    RateLimited,
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("prompt needs {needed} tokens but the ceiling is {max}")]
    BudgetExceeded { needed: usize, max: usize },
    #[error("query already cached: {0}")]
    DuplicateQuery(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body read).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// One HTTP GET per query; the response body is an HTML document the
/// crawler mines for result links.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Remaining token allowance, precomputed by the prompt assembler.
    pub max_tokens: usize,
    pub stop: Option<String>,
    pub temperature: f64,
}

#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<String>;
}
