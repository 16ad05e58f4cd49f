//! Immutable per-process relay settings.

use chatrelay_config::RelayConfig;
use std::time::Duration;

/// The orchestration inputs fixed at startup: directive text, model pair,
/// per-attempt timeout and window size.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    pub system_prompt: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub timeout: Duration,
    pub history_window: usize,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            history_window: config.history_window,
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}
