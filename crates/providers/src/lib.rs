//! Completion endpoint clients for ChatRelay.
//!
//! All providers implement the `chatrelay_core::Provider` trait. The relay
//! talks to one endpoint and selects the model per request, so a single
//! provider instance serves both the primary and the fallback model.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use chatrelay_config::AppConfig;
use chatrelay_core::Provider;
use std::sync::Arc;

/// Build the completion provider from configuration.
///
/// A missing API key yields a provider that sends an empty bearer token;
/// callers that must fail fast check `AppConfig::require_api_key` first.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let name = if config.llm.endpoint.contains("openrouter.ai") {
        "openrouter"
    } else {
        "openai_compat"
    };

    let mut provider = OpenAiCompatProvider::new(name, &config.llm.endpoint, api_key);
    if let Some(referer) = &config.llm.referer {
        provider = provider.with_header("HTTP-Referer", referer);
    }
    if let Some(title) = &config.llm.title {
        provider = provider.with_header("X-Title", title);
    }

    Arc::new(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_openrouter() {
        let provider = build_from_config(&AppConfig::default());
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn custom_endpoint_builds_generic_provider() {
        let mut config = AppConfig::default();
        config.llm.endpoint = "http://localhost:11434/v1/chat/completions".into();
        let provider = build_from_config(&config);
        assert_eq!(provider.name(), "openai_compat");
    }
}
