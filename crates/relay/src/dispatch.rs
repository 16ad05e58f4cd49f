//! Model dispatch: one timed attempt per model, primary then fallback.
//!
//! Every attempt writes two trace lines: `invoking model X` before the call and
//! the elapsed time after it, whatever the outcome. Upstream failures of any
//! kind (status, transport, malformed body, timeout) are handled the same way:
//! their text goes into the trace and the dispatcher moves on.

use crate::prompt::PromptSequence;
use crate::settings::RelaySettings;
use crate::trace::DispatchTrace;
use chatrelay_core::error::ProviderError;
use chatrelay_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

/// The result of a single model attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { content: String },
    Failure { detail: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success { .. })
    }
}

/// A reply together with the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Primary and fallback both failed. Details live in the trace only.
    #[error("LLM failed")]
    BothModelsExhausted,
}

/// Runs the primary/fallback state machine against one provider.
///
/// The same provider serves both models; the model name travels in the
/// request.
pub struct ModelDispatcher {
    provider: Arc<dyn Provider>,
    primary: String,
    fallback: String,
    timeout: Duration,
}

impl ModelDispatcher {
    pub fn new(
        provider: Arc<dyn Provider>,
        primary: impl Into<String>,
        fallback: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            primary: primary.into(),
            fallback: fallback.into(),
            timeout,
        }
    }

    pub fn from_settings(provider: Arc<dyn Provider>, settings: &RelaySettings) -> Self {
        Self::new(
            provider,
            settings.primary_model.clone(),
            settings.fallback_model.clone(),
            settings.timeout,
        )
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// A single attempt against `model`, bounded by `timeout`.
    pub async fn dispatch(
        &self,
        model: &str,
        prompt: &PromptSequence,
        timeout: Duration,
        trace: &mut DispatchTrace,
    ) -> AttemptOutcome {
        trace.push(format!("invoking model {model}"));
        info!(
            provider = %self.provider.name(),
            model = %model,
            messages = prompt.len(),
            "Dispatching completion"
        );

        let request = ProviderRequest {
            model: model.to_string(),
            messages: prompt.messages().to_vec(),
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "model '{model}' timed out after {}ms",
                timeout.as_millis()
            ))),
        };
        let elapsed_ms = started.elapsed().as_millis();

        match result {
            Ok(response) => {
                trace.push(format!("model {model} responded in {elapsed_ms} ms"));
                info!(model = %model, elapsed_ms = elapsed_ms as u64, "Model responded");
                AttemptOutcome::Success {
                    content: response.content,
                }
            }
            Err(e) => {
                let detail = e.to_string();
                trace.push(format!("model {model} failed after {elapsed_ms} ms: {detail}"));
                warn!(
                    model = %model,
                    elapsed_ms = elapsed_ms as u64,
                    error = %detail,
                    "Model attempt failed"
                );
                AttemptOutcome::Failure { detail }
            }
        }
    }

    /// Primary first; on failure, exactly one fallback attempt.
    pub async fn run(
        &self,
        prompt: &PromptSequence,
        trace: &mut DispatchTrace,
    ) -> Result<Dispatched, DispatchError> {
        match self.dispatch(&self.primary, prompt, self.timeout, trace).await {
            AttemptOutcome::Success { content } => {
                return Ok(Dispatched {
                    content,
                    model: self.primary.clone(),
                });
            }
            AttemptOutcome::Failure { .. } => {
                trace.push(format!(
                    "primary model {} failed, falling back to {}",
                    self.primary, self.fallback
                ));
                warn!(
                    primary = %self.primary,
                    fallback = %self.fallback,
                    "Primary model failed, trying fallback"
                );
            }
        }

        match self.dispatch(&self.fallback, prompt, self.timeout, trace).await {
            AttemptOutcome::Success { content } => Ok(Dispatched {
                content,
                model: self.fallback.clone(),
            }),
            AttemptOutcome::Failure { .. } => {
                trace.push(format!("fallback model {} failed, giving up", self.fallback));
                warn!(fallback = %self.fallback, "Both models exhausted");
                Err(DispatchError::BothModelsExhausted)
            }
        }
    }
}
