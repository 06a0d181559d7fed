use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlBridgeError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Missing parameter `{name}` for query `{sql}` (supplied: {params})")]
    MissingParameter {
        name: String,
        sql: String,
        params: String,
    },

    #[error("Invalid parameter shape: expected {expected} for query `{sql}`")]
    InvalidParameterShape { expected: String, sql: String },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Row conversion error: {0}")]
    RowConversion(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlBridgeError {
    /// True for errors raised while binding parameters, before any driver call.
    #[must_use]
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            SqlBridgeError::MissingParameter { .. } | SqlBridgeError::InvalidParameterShape { .. }
        )
    }
}
