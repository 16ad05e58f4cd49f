//! In-memory store, useful for testing and ephemeral deployments.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::{HistoryRecord, MessageId, Role, SessionId};
use chatrelay_core::store::MessageStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A store that keeps every row in a Vec, in insertion order.
pub struct InMemoryStore {
    rows: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a row as-is, bypassing validation. Lets tests seed rows with
    /// chosen timestamps or missing fields.
    pub async fn insert_raw(&self, record: HistoryRecord) {
        self.rows.write().await.push(record);
    }

    /// Every stored row, in insertion order.
    pub async fn all(&self) -> Vec<HistoryRecord> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, StoreError> {
        let id = MessageId::new();
        self.rows.write().await.push(HistoryRecord {
            id: id.clone(),
            session_id: session_id.clone(),
            role: Some(role.as_str().to_string()),
            content: Some(content.to_string()),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn query_recent(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = self.rows.read().await;

        let mut matching: Vec<(usize, &HistoryRecord)> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.session_id == session_id)
            .collect();

        // Newest first; equal timestamps fall back to insertion position.
        matching.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
