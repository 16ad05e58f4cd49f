//! Provider trait: the abstraction over the completion endpoint.
//!
//! A Provider knows how to send a prompt to an LLM and get the generated
//! text back as one complete reply. Partial/streamed replies are not part of
//! the relay's contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "meta-llama/llama-3-8b-instruct")
    pub model: String,

    /// The ordered prompt: system directive, history window, new message
    pub messages: Vec<ChatMessage>,
}

/// A successful completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated reply text
    pub content: String,

    /// Which model the endpoint reports as having answered
    pub model: String,
}

/// The core Provider trait.
///
/// The dispatcher calls `complete()` once per model attempt without knowing
/// which backend sits behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                content: last,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn default_health_check_is_healthy() {
        assert!(EchoProvider.health_check().await.unwrap());
    }

    #[test]
    fn request_serializes_wire_shape() {
        let req = ProviderRequest {
            model: "m".into(),
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
