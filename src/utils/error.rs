//! Error types for the rate limiter

use thiserror::Error;

/// Result type alias for the rate limiter
pub type Result<T> = std::result::Result<T, LimiterError>;

/// Main error type for the rate limiter
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation errors
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store deadline exceeded
    #[error("Store timeout: {0}")]
    Timeout(String),

    /// Unexpected atomic program reply shape
    #[error("Store protocol violation: {0}")]
    Protocol(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),
}

impl LimiterError {
    /// Whether the error came from the shared store rather than the caller's
    /// input. Store faults admit the request instead of failing it; input
    /// errors are returned to the caller.
    pub fn is_store_fault(&self) -> bool {
        matches!(
            self,
            LimiterError::Redis(_) | LimiterError::Timeout(_) | LimiterError::Protocol(_)
        )
    }
}
