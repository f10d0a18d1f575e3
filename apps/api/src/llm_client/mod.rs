/// LLM Client — the single point of entry for all chat-completion calls in the interviewer.
///
/// ARCHITECTURAL RULE: No other module may talk to a provider over HTTP directly.
/// Orchestration code acquires a `ProviderClient` from `provider::ProviderFactory`,
/// which binds a role, a pinned model, and a credential to the shared transport.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub mod normalize;
pub mod provider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Body of a single chat-completion call. Serialized as-is onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: &'static str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Builds the `[system, user]` message pair every orchestration call sends.
    pub fn new(
        model: &'static str,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: system.into(),
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: user.into(),
                },
            ],
            temperature,
            max_tokens,
        }
    }
}

/// Where a completion call goes and which credential authorizes it.
#[derive(Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Text returned by a provider for one completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The remote completion procedure. One call per invocation; implementations must not retry.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<Completion, LlmError>;
}

/// OpenAI-compatible `POST /chat/completions` transport. Groq and OpenAI both speak it.
#[derive(Clone)]
pub struct ChatCompletionsTransport {
    client: Client,
}

impl ChatCompletionsTransport {
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionTransport for ChatCompletionsTransport {
    async fn complete(
        &self,
        endpoint: &ProviderEndpoint,
        request: &CompletionRequest,
    ) -> Result<Completion, LlmError> {
        let url = format!(
            "{}/chat/completions",
            endpoint.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&endpoint.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("LLM API returned {status} for model {}", request.model);
            // Try to parse error message
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyContent)?;

        Ok(Completion {
            text,
            usage: parsed.usage,
        })
    }
}
