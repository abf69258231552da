use thiserror::Error;

/// Crate-wide error type.
///
/// Every fallible API returns `Result<_, SessionError>`. Native driver faults
/// are caught at the boundary, recorded on the owning [`Session`](crate::Session)
/// via its sticky error flag, logged, and surfaced as one of these variants;
/// they never cross this layer as a panic.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Statement preparation error: {0}")]
    PreparationError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Parameter bind error: {0}")]
    BindError(String),

    #[error("Usage error: {0}")]
    UsageError(String),
}
