//! OpenAI-compatible chat-completions client for recommendations.

use std::time::Duration;

use async_trait::async_trait;
use hyperisk_core::Verdict;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::recommend::{
    RecommendationGenerator, RecommendationUnavailable, SYSTEM_PROMPT, build_user_prompt,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("response had no message content")]
    EmptyResponse,
}

impl ChatError {
    /// Rate limits, server faults, and transport hiccups are worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Server { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse => false,
        }
    }
}

/// Settings for [`OpenAiRecommender`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    /// Like `https://api.openai.com` (no trailing slash needed).
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Extra attempts after the first failure, for retryable errors only.
    pub max_retries: u32,
    /// Upper bound on a single HTTP attempt, connect included.
    pub request_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: 2,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Recommendation generator backed by a chat-completions endpoint.
pub struct OpenAiRecommender {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiRecommender {
    pub fn new(mut config: OpenAiConfig) -> Result<Self, reqwest::Error> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        if config.api_key.is_none() {
            warn!("no API key configured; recommendations will be unavailable");
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(MAX_CONNECT_TIMEOUT))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, ChatError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[async_trait]
impl RecommendationGenerator for OpenAiRecommender {
    async fn generate(&self, verdict: Verdict) -> Result<String, RecommendationUnavailable> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RecommendationUnavailable::new("no API key configured"))?;
        let prompt = build_user_prompt(verdict);

        let mut attempt = 0;
        loop {
            match self.complete(api_key, &prompt).await {
                Ok(text) => {
                    debug!(%verdict, attempt, chars = text.len(), "recommendation generated");
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    warn!(%verdict, attempt, error = %e, ?delay, "recommendation failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(RecommendationUnavailable::with_source(
                        format!("chat completion failed after {} attempt(s)", attempt + 1),
                        e,
                    ));
                }
            }
        }
    }
}
