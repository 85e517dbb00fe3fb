use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

#[derive(Debug, Error)]
pub enum RemapMiddlewareError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unable to allocate memory while mapping results: {0}")]
    AllocationError(String),

    #[error("Other middleware error: {0}")]
    Other(String),
}

/// Errors reported by a [`TransformEngine`](crate::engine::TransformEngine).
///
/// None of these ever reach a caller of the wrapped client library; the adapter turns
/// them into diagnostics plus a pass-through (or absent) return value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine initialisation failed: {0}")]
    InitFailed(String),

    #[error("value mapping failed: {0}")]
    MappingFailed(String),

    #[error("query rewrite failed: {0}")]
    RewriteFailed(String),

    #[error("value cache clear failed: {0}")]
    CacheClearFailed(String),

    #[error("mapped value of {requested} bytes does not fit a cell of {capacity} bytes")]
    CellOverflow { capacity: usize, requested: usize },

    #[error("engine error: {0}")]
    Other(String),
}
