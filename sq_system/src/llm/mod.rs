//! Access to the language model backing the Dungeon Master.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::llm::mock::MockLlm;
use crate::llm::openai::OpenAiClient;

pub mod mock;
pub mod openai;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("The model returned no content")]
    EmptyResponse,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Canned responses, no network access.
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Falls back to `OPENAI_API_KEY` or `LLM_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Base address of an OpenAI compatible API, has to end with a `/`.
    pub address: Url,
    pub model: String,
    pub temperature: f32,
    /// Token limit for Dungeon Master responses.
    pub max_tokens: u32,
    /// Token limit for campaign and item introductions.
    pub intro_max_tokens: u32,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// The configured API key, or the first one found in the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or_else(|| std::env::var("LLM_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            api_key: None,
            address: Url::parse("https://api.openai.com/v1/").expect("Static URL is valid"),
            model: "gpt-4o".to_string(),
            temperature: 0.8,
            max_tokens: 500,
            intro_max_tokens: 1000,
            timeout_secs: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    /// Override of the configured token limit.
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// A single user prompt, as used for introductions.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: None,
        }
    }

    /// A system prompt followed by the player's message.
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The content of the final user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// The language model used for all generations.
#[derive(Clone, Debug)]
pub enum LlmBackend {
    OpenAi(Arc<OpenAiClient>),
    Mock(Arc<MockLlm>),
}

impl LlmBackend {
    /// Create the backend selected by `config.provider`.
    ///
    /// Fails when the OpenAI provider is selected without any API key available.
    pub fn from_config(config: &LlmConfig) -> eyre::Result<Self> {
        match config.provider {
            LlmProvider::OpenAi => {
                let Some(api_key) = config.resolve_api_key() else {
                    eyre::bail!("An LLM API key is required. Set `llm.api_key`, OPENAI_API_KEY or LLM_API_KEY, or use the `mock` provider");
                };
                Ok(Self::OpenAi(Arc::new(OpenAiClient::new(config.clone(), api_key)?)))
            }
            LlmProvider::Mock => Ok(Self::Mock(Arc::new(MockLlm::default()))),
        }
    }

    #[tracing::instrument(skip_all, fields(messages = request.messages.len()))]
    pub async fn generate(&self, request: GenerationRequest) -> Result<Generation, LlmError> {
        let generation = match self {
            LlmBackend::OpenAi(client) => client.chat(request).await?,
            LlmBackend::Mock(mock) => mock.generate(request)?,
        };

        if let Some(usage) = generation.usage {
            tracing::debug!(?usage, "Completed generation");
        }

        Ok(generation)
    }
}
