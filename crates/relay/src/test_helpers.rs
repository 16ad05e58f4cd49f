//! Shared test doubles for the relay pipeline.

use async_trait::async_trait;
use chatrelay_core::error::{ProviderError, StoreError};
use chatrelay_core::message::{HistoryRecord, MessageId, Role, SessionId};
use chatrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
use chatrelay_core::store::MessageStore;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// How the scripted provider answers for one model.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(ProviderError),
    Hang,
}

/// A provider whose behavior is scripted per model name.
///
/// Records every request so tests can inspect prompts and call order.
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(model, script)| (model.to_string(), script.clone()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Models in the order they were invoked.
    pub fn called_models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }
}

pub fn reply(text: &str) -> Script {
    Script::Reply(text.into())
}

pub fn server_error() -> Script {
    Script::Fail(ProviderError::ApiError {
        status_code: 500,
        message: "Internal Server Error".into(),
    })
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.scripts.get(&request.model) {
            Some(Script::Reply(text)) => Ok(ProviderResponse {
                content: text.clone(),
                model: request.model,
            }),
            Some(Script::Fail(err)) => Err(err.clone()),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Network("hang ended".into()))
            }
            None => Err(ProviderError::NotConfigured(format!(
                "no script for model '{}'",
                request.model
            ))),
        }
    }
}

/// A store that fails the selected operations.
pub struct FailingStore {
    pub fail_insert_role: Option<Role>,
    pub fail_query: bool,
    pub inserts: Mutex<Vec<(Role, String)>>,
}

impl FailingStore {
    pub fn failing_insert(role: Role) -> Self {
        Self {
            fail_insert_role: Some(role),
            fail_query: false,
            inserts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_query() -> Self {
        Self {
            fail_insert_role: None,
            fail_query: true,
            inserts: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn insert(
        &self,
        _session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, StoreError> {
        if self.fail_insert_role == Some(role) {
            return Err(StoreError::Storage("disk full".into()));
        }
        self.inserts.lock().unwrap().push((role, content.to_string()));
        Ok(MessageId::new())
    }

    async fn query_recent(
        &self,
        _session_id: &SessionId,
        _limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        if self.fail_query {
            return Err(StoreError::QueryFailed("connection reset".into()));
        }
        Ok(Vec::new())
    }
}
