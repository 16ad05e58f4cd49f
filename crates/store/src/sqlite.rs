//! SQLite message store.
//!
//! One table holds every message of every session:
//!
//! ```text
//! seq        INTEGER PRIMARY KEY AUTOINCREMENT  -- insertion order, tie-breaker
//! id         TEXT UNIQUE NOT NULL
//! session_id TEXT NOT NULL
//! role       TEXT
//! content    TEXT
//! created_at TEXT NOT NULL                      -- RFC 3339, microseconds, UTC
//! ```
//!
//! `role` and `content` are nullable so rows written by other tools load
//! without failing the whole query; the history window filters them.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::{HistoryRecord, MessageId, Role, SessionId};
use chatrelay_core::store::MessageStore;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A SQLite-backed message store.
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteStore {
    /// Open (or create) the database at `path` using the `messages` table.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        Self::open(path, "messages").await
    }

    /// Open (or create) the database at `path` using a custom table name.
    pub async fn open(path: &str, table: &str) -> Result<Self, StoreError> {
        if !is_valid_identifier(table) {
            return Err(StoreError::Storage(format!("Invalid table name '{table}'")));
        }

        let in_memory = path == ":memory:" || path.contains(":memory:");
        let options = if in_memory || path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
        } else {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Storage(format!("Cannot create {}: {e}", parent.display()))
                })?;
            }
            SqliteConnectOptions::new().filename(path)
        };

        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to ":memory:" is a separate database.
        let max_connections = if in_memory { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.run_migrations().await?;
        info!("SQLite message store initialized at {path}");
        Ok(store)
    }

    /// Create the table and its ordering index if missing.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        let table = &self.table;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                session_id  TEXT NOT NULL,
                role        TEXT,
                content     TEXT,
                created_at  TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("{table} table: {e}")))?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_session_created \
             ON {table}(session_id, created_at DESC, seq DESC)"
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `HistoryRecord` from a SQLite row.
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRecord, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| StoreError::QueryFailed(format!("session_id column: {e}")))?;
        let role: Option<String> = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let content: Option<String> = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| {
                warn!(id = %id, value = %created_at_str, "Unparseable created_at, using epoch");
                chrono::DateTime::<Utc>::default()
            });

        Ok(HistoryRecord {
            id: MessageId(id),
            session_id: SessionId(session_id),
            role,
            content,
            created_at,
        })
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(
        &self,
        session_id: &SessionId,
        role: Role,
        content: &str,
    ) -> Result<MessageId, StoreError> {
        let id = MessageId::new();
        // Fixed width so lexical order in SQL equals chronological order.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(&format!(
            "INSERT INTO {} (id, session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.table
        ))
        .bind(&id.0)
        .bind(session_id.as_str())
        .bind(role.as_str())
        .bind(content)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!(session = %session_id, role = %role, "Stored message {id}");
        Ok(id)
    }

    async fn query_recent(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT id, session_id, role, content, created_at FROM {} \
             WHERE session_id = ?1 \
             ORDER BY created_at DESC, seq DESC \
             LIMIT ?2",
            self.table
        ))
        .bind(session_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("History query: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn insert_and_query_newest_first() {
        let (_dir, store) = test_store().await;
        let sid = SessionId::from("s1");
        for (role, text) in [
            (Role::User, "hi"),
            (Role::Assistant, "what"),
            (Role::User, "rude"),
        ] {
            store.insert(&sid, role, text).await.unwrap();
        }

        let rows = store.query_recent(&sid, 10).await.unwrap();
        let contents: Vec<_> = rows.iter().filter_map(|r| r.content.clone()).collect();
        assert_eq!(contents, vec!["rude", "what", "hi"]);
        assert_eq!(rows[0].role.as_deref(), Some("user"));
        assert_eq!(rows[1].role.as_deref(), Some("assistant"));
    }

    #[tokio::test]
    async fn limit_keeps_most_recent() {
        let (_dir, store) = test_store().await;
        let sid = SessionId::from("s1");
        for i in 0..10 {
            store.insert(&sid, Role::User, &format!("m{i}")).await.unwrap();
        }

        let rows = store.query_recent(&sid, 3).await.unwrap();
        let contents: Vec<_> = rows.iter().filter_map(|r| r.content.clone()).collect();
        assert_eq!(contents, vec!["m9", "m8", "m7"]);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (_dir, store) = test_store().await;
        store.insert(&SessionId::from("a"), Role::User, "a1").await.unwrap();
        store.insert(&SessionId::from("b"), Role::User, "b1").await.unwrap();

        let rows = store.query_recent(&SessionId::from("b"), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session_id.as_str(), "b");
    }

    #[tokio::test]
    async fn equal_timestamps_break_ties_by_insertion() {
        let (_dir, store) = test_store().await;
        for (id, text) in [("x1", "first"), ("x2", "second")] {
            sqlx::query(
                "INSERT INTO messages (id, session_id, role, content, created_at) \
                 VALUES (?1, 's', 'user', ?2, '2024-05-01T12:00:00.000000Z')",
            )
            .bind(id)
            .bind(text)
            .execute(&store.pool)
            .await
            .unwrap();
        }

        let rows = store.query_recent(&SessionId::from("s"), 2).await.unwrap();
        assert_eq!(rows[0].id.0, "x2");
        assert_eq!(rows[1].id.0, "x1");
    }

    #[tokio::test]
    async fn null_columns_load_as_none() {
        let (_dir, store) = test_store().await;
        sqlx::query(
            "INSERT INTO messages (id, session_id, role, content, created_at) \
             VALUES ('legacy', 's', NULL, NULL, '2024-05-01T12:00:00.000000Z')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let rows = store.query_recent(&SessionId::from("s"), 5).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].role.is_none());
        assert!(rows[0].content.is_none());
    }

    #[tokio::test]
    async fn reopening_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("messages.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::new(path).await.unwrap();
            store.insert(&SessionId::from("s"), Role::User, "persisted").await.unwrap();
        }

        let store = SqliteStore::new(path).await.unwrap();
        let rows = store.query_recent(&SessionId::from("s"), 5).await.unwrap();
        assert_eq!(rows[0].content.as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn in_memory_database_works() {
        let store = SqliteStore::new(":memory:").await.unwrap();
        store.insert(&SessionId::from("s"), Role::User, "ephemeral").await.unwrap();
        assert_eq!(store.query_recent(&SessionId::from("s"), 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unsafe_table_names() {
        let result = SqliteStore::open(":memory:", "messages; DROP TABLE x").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert!(is_valid_identifier("chat_messages"));
        assert!(!is_valid_identifier("1messages"));
    }
}
