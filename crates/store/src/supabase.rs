//! Supabase message store over the PostgREST HTTP API.
//!
//! Expects a table shaped like:
//!
//! ```sql
//! create table messages (
//!   id bigint generated always as identity primary key,
//!   session_id text not null,
//!   role text,
//!   content text,
//!   created_at timestamptz not null default now()
//! );
//! ```
//!
//! The database stamps `created_at`; ties are broken by `id`.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::{HistoryRecord, MessageId, Role, SessionId};
use chatrelay_core::store::MessageStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A message store backed by a Supabase project.
pub struct SupabaseStore {
    table_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Create a store for `table` in the project at `project_url`.
    pub fn new(project_url: &str, api_key: impl Into<String>, table: &str) -> Self {
        Self {
            table_url: format!("{}/rest/v1/{}", project_url.trim_end_matches('/'), table),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn row_to_record(row: SupabaseRow, session_id: &SessionId) -> HistoryRecord {
        let created_at = row
            .created_at
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();

        HistoryRecord {
            id: MessageId(value_to_id(&row.id)),
            session_id: row.session_id.map(SessionId).unwrap_or_else(|| session_id.clone()),
            role: row.role,
            content: row.content,
            created_at,
        }
    }
}

/// Render a PostgREST id (bigint or uuid) as a string.
fn value_to_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl MessageStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, StoreError> {
        let body = NewRow {
            session_id: session_id.as_str(),
            role: role.as_str(),
            content,
        };

        let response = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("Supabase insert: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Supabase insert rejected");
            return Err(StoreError::Storage(format!(
                "Supabase insert failed (status {}): {text}",
                status.as_u16()
            )));
        }

        let rows: Vec<SupabaseRow> = response
            .json()
            .await
            .map_err(|e| StoreError::Storage(format!("Supabase insert response: {e}")))?;

        let id = rows
            .first()
            .map(|r| MessageId(value_to_id(&r.id)))
            .ok_or_else(|| StoreError::Storage("Supabase insert returned no row".into()))?;

        debug!(session = %session_id, role = %role, "Stored message {id}");
        Ok(id)
    }

    async fn query_recent(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let filter = format!("eq.{}", session_id.as_str());
        let limit = limit.to_string();

        let response = self
            .authorized(self.client.get(&self.table_url))
            .query(&[
                ("select", "id,session_id,role,content,created_at"),
                ("session_id", filter.as_str()),
                ("order", "created_at.desc,id.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Supabase query: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::QueryFailed(format!(
                "Supabase query failed (status {}): {text}",
                status.as_u16()
            )));
        }

        let rows: Vec<SupabaseRow> = response
            .json()
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Supabase query response: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| Self::row_to_record(row, session_id))
            .collect())
    }
}

#[derive(Serialize)]
struct NewRow<'a> {
    session_id: &'a str,
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SupabaseRow {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}
