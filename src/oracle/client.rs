//! Async LLM client for the decomposition stages
//!
//! Model-agnostic HTTP client supporting both Anthropic and
//! OpenAI-compatible APIs (DeepSeek, etc). One client is built per stage so
//! each stage can use its own model and prompt cache key.

use crate::core::config::{OracleConfig, RetryConfig, StageConfig};
use crate::core::error::{PilotError, Result};
use crate::oracle::Oracle;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    prompt_cache_key: Option<String>,
    api_format: ApiFormat,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String, retry: RetryConfig) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        let client = Client::builder()
            .timeout(retry.timeout())
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            api_url,
            model,
            prompt_cache_key: None,
            api_format,
            max_retries: retry.max_retries,
        }
    }

    /// Build a client for one decomposition stage.
    ///
    /// The API key comes from the `LLM_API_KEY` environment variable; the
    /// endpoint, model, and cache key come from config.
    pub fn for_stage(
        oracle: &OracleConfig,
        stage: &StageConfig,
        retry: RetryConfig,
    ) -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| PilotError::Config("LLM_API_KEY not set".into()))?;
        let mut client = Self::new(api_key, oracle.api_url.clone(), stage.model.clone(), retry);
        client.prompt_cache_key = stage.prompt_cache_key.clone();
        Ok(client)
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Send a completion request, retrying transport failures up to the
    /// configured bound. Non-success API statuses are not retried.
    async fn complete_with_retry(&self, system: &str, user: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let result = match self.api_format {
                ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
                ApiFormat::OpenAI => self.complete_openai(system, user).await,
            };
            match result {
                Ok(text) => return Ok(text),
                Err(err @ PilotError::UpstreamUnavailable(_)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "oracle call failed ({}), retry {}/{}",
                        err,
                        attempt,
                        self.max_retries
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 8192,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PilotError::UpstreamUnavailable(format!(
                "API error: {}",
                error_text
            )));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| PilotError::contract("empty oracle response", ""))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: 8192,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            prompt_cache_key: self.prompt_cache_key.clone(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PilotError::UpstreamUnavailable(format!(
                "API error: {}",
                error_text
            )));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| PilotError::contract("empty oracle response", ""))
    }
}

impl Oracle for LlmClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.complete_with_retry(system, user).await
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_cache_key: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
