//! Error types for the ChatRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context (completion endpoint, message store) has its own enum;
//! configuration and turn errors live with the crates that raise them.

use thiserror::Error;

/// A failed call to the completion endpoint.
///
/// The relay never branches on the variant: every kind is a failed attempt
/// and only its rendered text survives in the dispatch trace.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed (status: {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Store not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_status_and_body() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "upstream overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream overloaded"));
    }

    #[test]
    fn store_error_keeps_backend_detail() {
        let err = StoreError::QueryFailed("no such table: messages".into());
        assert_eq!(err.to_string(), "Query failed: no such table: messages");
        assert!(matches!(err.clone(), StoreError::QueryFailed(_)));
    }
}
