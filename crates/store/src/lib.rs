//! Message store implementations for ChatRelay.

pub mod in_memory;
pub mod supabase;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use supabase::SupabaseStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use chatrelay_config::StoreConfig;
use chatrelay_core::error::StoreError;
use chatrelay_core::store::MessageStore;
use std::sync::Arc;
use tracing::info;

/// Build the configured message store.
pub async fn build_from_config(config: &StoreConfig) -> Result<Arc<dyn MessageStore>, StoreError> {
    let store: Arc<dyn MessageStore> = match config.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(SqliteStore::open(&config.path, &config.table).await?),
        "supabase" => {
            let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_key) else {
                return Err(StoreError::NotConfigured(
                    "supabase backend needs supabase_url and supabase_key".into(),
                ));
            };
            Arc::new(SupabaseStore::new(url, key.clone(), &config.table))
        }
        other => {
            return Err(StoreError::NotConfigured(format!(
                "unsupported store backend '{other}'"
            )));
        }
    };

    info!(backend = store.name(), "Message store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_memory_backend() {
        let config = StoreConfig {
            backend: "memory".into(),
            ..StoreConfig::default()
        };
        let store = build_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "in_memory");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn builds_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: "sqlite".into(),
            path: dir.path().join("m.db").to_string_lossy().into_owned(),
            ..StoreConfig::default()
        };
        let store = build_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn supabase_without_credentials_is_rejected() {
        let config = StoreConfig {
            backend: "supabase".into(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            build_from_config(&config).await,
            Err(StoreError::NotConfigured(_))
        ));
    }
}
