//! Turn orchestration, the single entry point of the relay.

use crate::dispatch::{DispatchError, ModelDispatcher};
use crate::prompt::assemble;
use crate::settings::RelaySettings;
use crate::trace::DispatchTrace;
use crate::window::HistoryWindowBuilder;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::{Role, SessionId};
use chatrelay_core::provider::Provider;
use chatrelay_core::store::MessageStore;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// A delivered reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub reply: String,
    pub trace: Vec<String>,
    pub model: String,
}

#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("session_id and message must be non-empty")]
    InvalidInput,

    #[error("failed to persist user message: {0}")]
    InboundNotPersisted(StoreError),

    #[error("failed to load history: {0}")]
    HistoryUnavailable(StoreError),

    #[error("LLM failed")]
    BothModelsExhausted,

    #[error("failed to persist assistant reply: {0}")]
    ReplyNotPersisted(StoreError),
}

impl From<DispatchError> for TurnError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::BothModelsExhausted => TurnError::BothModelsExhausted,
        }
    }
}

/// A failed turn. The trace holds whatever the dispatcher recorded before the
/// failure; it is empty when the turn never reached dispatch.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct TurnFailure {
    pub error: TurnError,
    pub trace: Vec<String>,
}

impl TurnFailure {
    fn before_dispatch(error: TurnError) -> Self {
        Self {
            error,
            trace: Vec::new(),
        }
    }
}

/// Persist, window, assemble, dispatch, persist.
///
/// Holds no per-turn state; share it behind an `Arc` across requests.
pub struct TurnOrchestrator {
    store: Arc<dyn MessageStore>,
    window: HistoryWindowBuilder,
    dispatcher: ModelDispatcher,
    settings: RelaySettings,
}

impl TurnOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn MessageStore>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            window: HistoryWindowBuilder::new(store.clone()),
            dispatcher: ModelDispatcher::from_settings(provider, &settings),
            store,
            settings,
        }
    }

    pub async fn handle_turn(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> Result<TurnReply, TurnFailure> {
        let session = SessionId::from(session_id);
        if session.is_empty() || user_message.is_empty() {
            return Err(TurnFailure::before_dispatch(TurnError::InvalidInput));
        }

        info!(session = %session, "Turn started");

        let inbound_id = self
            .store
            .insert(&session, Role::User, user_message)
            .await
            .map_err(|e| {
                error!(session = %session, error = %e, "Failed to persist user message");
                TurnFailure::before_dispatch(TurnError::InboundNotPersisted(e))
            })?;

        let window = self
            .window
            .build_window_excluding(&session, self.settings.history_window, Some(&inbound_id))
            .await
            .map_err(|e| {
                error!(session = %session, error = %e, "Failed to load history window");
                TurnFailure::before_dispatch(TurnError::HistoryUnavailable(e))
            })?;

        let prompt = assemble(&self.settings.system_prompt, &window, user_message);

        let mut trace = DispatchTrace::new();
        let dispatched = match self.dispatcher.run(&prompt, &mut trace).await {
            Ok(d) => d,
            Err(e) => {
                warn!(session = %session, "Turn failed: no model produced a reply");
                return Err(TurnFailure {
                    error: e.into(),
                    trace: trace.into_lines(),
                });
            }
        };

        if let Err(e) = self
            .store
            .insert(&session, Role::Assistant, &dispatched.content)
            .await
        {
            error!(session = %session, error = %e, "Failed to persist assistant reply");
            return Err(TurnFailure {
                error: TurnError::ReplyNotPersisted(e),
                trace: trace.into_lines(),
            });
        }

        info!(
            session = %session,
            model = %dispatched.model,
            window = window.len(),
            "Turn completed"
        );

        Ok(TurnReply {
            reply: dispatched.content,
            trace: trace.into_lines(),
            model: dispatched.model,
        })
    }
}
