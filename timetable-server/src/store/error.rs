//! Store error types.

/// Errors from loading or querying a transit data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Snapshot file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot JSON could not be decoded
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Backend failed while answering a query
    #[error("query failed: {0}")]
    Query(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Query("connection reset".into());
        assert_eq!(err.to_string(), "query failed: connection reset");

        let err: StoreError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON parse error"));
    }
}
