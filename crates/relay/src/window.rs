//! History window: the bounded, chronological slice of prior messages
//! supplied to the model as context.

use chatrelay_core::error::StoreError;
use chatrelay_core::message::{HistoryRecord, Message, MessageId, Role, SessionId};
use chatrelay_core::store::MessageStore;
use std::sync::Arc;
use tracing::debug;

/// Prior messages of one session, oldest first. Rebuilt on every turn.
pub type ConversationWindow = Vec<Message>;

/// Reads the most recent messages of a session back from the store.
pub struct HistoryWindowBuilder {
    store: Arc<dyn MessageStore>,
}

impl HistoryWindowBuilder {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// The `limit` most recent messages of `session_id`, in chronological
    /// order. A session without history yields an empty window.
    pub async fn build_window(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<ConversationWindow, StoreError> {
        self.build_window_excluding(session_id, limit, None).await
    }

    /// Like [`build_window`](Self::build_window), but leaves out the row
    /// `exclude` (the message of the turn in flight, which the prompt appends
    /// on its own). Still returns at most `limit` prior messages.
    pub async fn build_window_excluding(
        &self,
        session_id: &SessionId,
        limit: usize,
        exclude: Option<&MessageId>,
    ) -> Result<ConversationWindow, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let fetch = limit + usize::from(exclude.is_some());
        let mut rows = self.store.query_recent(session_id, fetch).await?;

        if let Some(id) = exclude {
            rows.retain(|r| &r.id != id);
        }
        // Rows arrive newest first, so truncating keeps the most recent.
        rows.truncate(limit);
        rows.reverse();

        let fetched = rows.len();
        let window: ConversationWindow = rows.into_iter().filter_map(to_message).collect();

        debug!(
            session = %session_id,
            fetched,
            kept = window.len(),
            "History window built"
        );
        Ok(window)
    }
}

/// Validate a raw row. Rows without a usable role or content are dropped.
fn to_message(record: HistoryRecord) -> Option<Message> {
    let role_text = record.role.as_deref().map(str::trim).unwrap_or_default();
    let content = record.content.unwrap_or_default();

    if role_text.is_empty() || content.is_empty() {
        debug!(id = %record.id, "Dropping history row with missing role or content");
        return None;
    }

    let role: Role = match role_text.parse() {
        Ok(role) => role,
        Err(reason) => {
            debug!(id = %record.id, %reason, "Dropping history row");
            return None;
        }
    };

    Some(Message {
        session_id: record.session_id,
        role,
        content,
        created_at: record.created_at,
    })
}
