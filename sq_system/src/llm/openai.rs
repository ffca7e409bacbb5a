use std::time::Duration;
use reqwest::ClientBuilder;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::llm::{ChatMessage, Generation, GenerationRequest, LlmConfig, LlmError, TokenUsage};

/// Client for an OpenAI compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    pub config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("address", &self.config.address.as_str())
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(config: LlmConfig, api_key: String) -> eyre::Result<Self> {
        let client = ClientBuilder::default()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    #[tracing::instrument(skip_all, fields(model = %self.config.model))]
    pub async fn chat(&self, request: GenerationRequest) -> Result<Generation, LlmError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature.unwrap_or(self.config.temperature),
        };

        let url = self.url("chat/completions").map_err(|e| LlmError::Unavailable(e.to_string()))?;
        let response = self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status, %message, "Chat completion request was rejected");
            return Err(LlmError::Api { status, message });
        }

        let response: ChatResponse = response.json().await.map_err(|e| LlmError::Parse(e.to_string()))?;
        let content = response.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(Generation {
            content,
            usage: response.usage.map(|u| TokenUsage {
                prompt: u.prompt_tokens,
                completion: u.completion_tokens,
                total: u.total_tokens,
            }),
        })
    }

    fn url(&self, path: &str) -> eyre::Result<Url> {
        Ok(self.config.address.join(path)?)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use crate::llm::{GenerationRequest, LlmConfig, LlmError};
    use crate::llm::openai::OpenAiClient;

    async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "Incorrect API key"}})));
        }
        let last = body["messages"].as_array().and_then(|m| m.last()).cloned().unwrap_or_default();

        (StatusCode::OK, Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": format!("  You said: {}\n", last["content"].as_str().unwrap_or_default()) } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 },
            "echo": { "model": body["model"], "max_tokens": body["max_tokens"] }
        })))
    }

    async fn start_server() -> eyre::Result<url::Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new().route("/v1/chat/completions", post(completions));
        tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(format!("http://{addr}/v1/").parse()?)
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn chat_returns_trimmed_content_and_usage() -> eyre::Result<()> {
        let address = start_server().await?;
        let client = OpenAiClient::new(LlmConfig { address, ..Default::default() }, "test-key".into())?;

        let out = client.chat(GenerationRequest::with_system("You are a DM", "I look around")).await?;

        assert_eq!(out.content, "You said: I look around");
        assert_eq!(out.usage.map(|u| u.total), Some(16));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_requests_surface_status() -> eyre::Result<()> {
        let address = start_server().await?;
        let client = OpenAiClient::new(LlmConfig { address, ..Default::default() }, "wrong-key".into())?;

        let err = client.chat(GenerationRequest::prompt("Hello")).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 401, .. }));
        Ok(())
    }
}
