//! Error types for TrailScribe

use thiserror::Error;

/// Result type alias for TrailScribe operations
pub type Result<T> = std::result::Result<T, TrailScribeError>;

/// Main error type for TrailScribe
#[derive(Error, Debug)]
pub enum TrailScribeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The backing store could not be opened. Never folded into an empty result.
    #[error("Store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrailScribeError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrailScribeError::StoreUnavailable { .. } | TrailScribeError::Sync(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TrailScribeError::Sync("offline".into()).is_retryable());
        assert!(!TrailScribeError::InvalidInput("zoom".into()).is_retryable());
        assert!(!TrailScribeError::NotFound(3).is_retryable());

        let unavailable = TrailScribeError::StoreUnavailable {
            path: "/nope/trailscribe.db".into(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("/nope/trailscribe.db"));
    }
}
