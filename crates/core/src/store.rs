//! MessageStore trait: durable storage of conversation messages.
//!
//! The relay needs exactly two operations from storage: append a message to
//! a session and read back the newest rows of a session.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::{HistoryRecord, MessageId, Role, SessionId};

/// The core MessageStore trait.
///
/// Implementations: in-memory (for testing), SQLite, Supabase.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "supabase", "in_memory").
    fn name(&self) -> &str;

    /// Persist one message and return its store-assigned id.
    ///
    /// The store stamps `created_at` at insertion time.
    async fn insert(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, StoreError>;

    /// Fetch up to `limit` rows of a session, newest first.
    ///
    /// Rows are ordered by `created_at` descending; rows with equal
    /// timestamps come back in reverse insertion order.
    async fn query_recent(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError>;
}
