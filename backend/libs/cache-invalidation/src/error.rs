//! Error types for revalidation operations

use thiserror::Error;

/// Revalidation errors
#[derive(Error, Debug)]
pub enum InvalidationError {
    /// Redis connection or operation error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Message serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid message or key format
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Path is not an absolute page path
    #[error("Invalid revalidation path: {0:?}")]
    InvalidPath(String),

    /// Callback execution failed
    #[error("Callback execution failed: {0}")]
    CallbackFailed(String),
}
