//! OpenAI-compatible completion client.
//!
//! Works with: OpenRouter, OpenAI, Ollama, vLLM, Together AI, and any endpoint
//! exposing the `/chat/completions` request and response shape.
//!
//! The relay only needs one complete reply per request, so this client does
//! a single non-streaming POST and reads `choices[0].message.content`.

use async_trait::async_trait;
use chatrelay_core::error::ProviderError;
use chatrelay_core::message::ChatMessage;
use chatrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    endpoint: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider posting to the full chat completions URL `endpoint`.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
            client: build_client(Duration::from_secs(120)),
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(
            "openrouter",
            "https://openrouter.ai/api/v1/chat/completions",
            api_key,
        )
    }

    /// Send an additional header with every request (e.g. `X-Title`).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Replace the transport-level timeout (the relay applies its own
    /// per-attempt timeout on top).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The model listing URL next to the completions endpoint, if derivable.
    fn models_url(&self) -> Option<String> {
        self.endpoint
            .strip_suffix("/chat/completions")
            .map(|base| format!("{base}/models"))
    }

    /// Convert prompt entries to the API message format.
    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Extract the reply text from a raw success body.
    fn parse_reply(body: &str) -> Result<(String, Option<String>), ProviderError> {
        let api_response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let content = choice.message.content.ok_or_else(|| {
            ProviderError::MalformedResponse("Response choice has no message content".into())
        })?;

        Ok((content, api_response.model))
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = ApiRequest {
            model: &request.model,
            messages: Self::to_api_messages(&request.messages),
        };

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }

        let (content, model) = Self::parse_reply(&text)?;

        Ok(ProviderResponse {
            content,
            model: model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let Some(url) = self.models_url() else {
            return Ok(true);
        };

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn prompt() -> ProviderRequest {
        ProviderRequest {
            model: "meta-llama/llama-3-8b-instruct".into(),
            messages: vec![ChatMessage::system("be rude"), ChatMessage::user("hi")],
        }
    }

    #[test]
    fn openrouter_constructor() {
        let provider = OpenAiCompatProvider::openrouter("sk-test");
        assert_eq!(provider.name(), "openrouter");
        assert!(provider.endpoint().contains("openrouter.ai"));
        assert_eq!(
            provider.models_url().as_deref(),
            Some("https://openrouter.ai/api/v1/models")
        );
    }

    #[test]
    fn message_conversion() {
        let api = OpenAiCompatProvider::to_api_messages(&prompt().messages);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content, "hi");
    }

    #[test]
    fn parse_reply_reads_first_choice() {
        let (content, model) = OpenAiCompatProvider::parse_reply(
            r#"{"model":"m-1","choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(content, "hello");
        assert_eq!(model.as_deref(), Some("m-1"));
    }

    #[test]
    fn parse_reply_rejects_missing_content() {
        let err = OpenAiCompatProvider::parse_reply(r#"{"choices":[{"message":{"role":"assistant"}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));

        let err = OpenAiCompatProvider::parse_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn completes_against_upstream() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let title = headers
                    .get("x-title")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let count = body["messages"].as_array().map(|a| a.len()).unwrap_or(0);
                Json(json!({
                    "model": body["model"],
                    "choices": [{"message": {"role": "assistant", "content": format!("{auth}|{title}|{count}")}}]
                }))
            }),
        );
        let base = spawn_upstream(router).await;

        let provider = OpenAiCompatProvider::new("test", format!("{base}/v1/chat/completions"), "sk-abc")
            .with_header("X-Title", "Relay Test");
        let response = provider.complete(prompt()).await.unwrap();

        assert_eq!(response.content, "Bearer sk-abc|Relay Test|2");
        assert_eq!(response.model, "meta-llama/llama-3-8b-instruct");
    }

    #[tokio::test]
    async fn non_success_status_keeps_status_and_body() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model overloaded") }),
        );
        let base = spawn_upstream(router).await;

        let provider = OpenAiCompatProvider::new("test", format!("{base}/v1/chat/completions"), "k");
        match provider.complete(prompt()).await.unwrap_err() {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 503);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { "<html>gateway</html>" }),
        );
        let base = spawn_upstream(router).await;

        let provider = OpenAiCompatProvider::new("test", format!("{base}/v1/chat/completions"), "k");
        let err = provider.complete(prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider = OpenAiCompatProvider::new("test", "http://127.0.0.1:1/v1/chat/completions", "k")
            .with_timeout(Duration::from_secs(2));
        let err = provider.complete(prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test]
    async fn health_check_probes_models_listing() {
        let router = Router::new().route("/v1/models", get(|| async { Json(json!({"data": []})) }));
        let base = spawn_upstream(router).await;

        let provider = OpenAiCompatProvider::new("test", format!("{base}/v1/chat/completions"), "k");
        assert!(provider.health_check().await.unwrap());
    }
}
