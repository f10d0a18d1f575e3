//! Provider Client Factory — binds each orchestration role to a provider, a pinned model,
//! and the credential configured for it.
//!
//! Clients are built fresh for every call and never cached. The factory refuses to build a
//! client when the role's credential is absent, so a missing key never reaches the network.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::llm_client::{
    Completion, CompletionRequest, CompletionTransport, LlmError, ProviderEndpoint,
};

/// Model pinned for question and reference-answer generation (Groq).
/// Hardcoded to prevent accidental drift between environments.
pub const QUESTIONS_MODEL: &str = "llama-3.3-70b-versatile";
/// Model pinned for answer evaluation (OpenAI).
pub const EVALUATION_MODEL: &str = "gpt-4o-mini";

pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Use-case binding of an orchestration function to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderRole {
    QuestionsAndReference,
    Evaluation,
}

impl ProviderRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderRole::QuestionsAndReference => "questions-and-reference",
            ProviderRole::Evaluation => "evaluation",
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            ProviderRole::QuestionsAndReference => QUESTIONS_MODEL,
            ProviderRole::Evaluation => EVALUATION_MODEL,
        }
    }

    /// Name of the environment variable holding this role's credential.
    pub fn credential_setting(self) -> &'static str {
        match self {
            ProviderRole::QuestionsAndReference => GROQ_API_KEY,
            ProviderRole::Evaluation => OPENAI_API_KEY,
        }
    }
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{setting} is required for the {role} provider. Please set it in your .env file or environment variables.")]
pub struct ConfigurationError {
    pub role: ProviderRole,
    pub setting: &'static str,
}

/// Credential and endpoint configured for one role.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Per-role provider settings, read once from `Config` at startup.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub questions: ProviderSettings,
    pub evaluation: ProviderSettings,
}

impl ProviderCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            questions: ProviderSettings {
                api_key: config.groq_api_key.clone(),
                base_url: config.groq_base_url.clone(),
            },
            evaluation: ProviderSettings {
                api_key: config.openai_api_key.clone(),
                base_url: config.openai_base_url.clone(),
            },
        }
    }

    fn settings(&self, role: ProviderRole) -> &ProviderSettings {
        match role {
            ProviderRole::QuestionsAndReference => &self.questions,
            ProviderRole::Evaluation => &self.evaluation,
        }
    }
}

#[derive(Clone)]
pub struct ProviderFactory {
    credentials: ProviderCredentials,
    transport: Arc<dyn CompletionTransport>,
}

impl ProviderFactory {
    pub fn new(credentials: ProviderCredentials, transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Returns an authenticated client for `role`, or the setting that must be provided.
    pub fn client(&self, role: ProviderRole) -> Result<ProviderClient, ConfigurationError> {
        let settings = self.credentials.settings(role);
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigurationError {
                role,
                setting: role.credential_setting(),
            })?;

        Ok(ProviderClient {
            role,
            endpoint: ProviderEndpoint {
                base_url: settings.base_url.clone(),
                api_key: api_key.to_string(),
            },
            transport: Arc::clone(&self.transport),
        })
    }

    pub fn is_configured(&self, role: ProviderRole) -> bool {
        self.client(role).is_ok()
    }
}

/// A handle bound to one role's credential. Holds no state beyond it.
pub struct ProviderClient {
    role: ProviderRole,
    endpoint: ProviderEndpoint,
    transport: Arc<dyn CompletionTransport>,
}

impl ProviderClient {
    pub fn role(&self) -> ProviderRole {
        self.role
    }

    pub fn model(&self) -> &'static str {
        self.role.model()
    }

    /// One `[system, user]` completion call against the role's pinned model.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Completion, LlmError> {
        let request = CompletionRequest::new(self.model(), system, user, temperature, max_tokens);
        self.transport.complete(&self.endpoint, &request).await
    }
}
