//! Error types for timer queue operations.
//!
//! Insertion and retrieval report rejection through `bool` and `Option`
//! returns; these errors cover configuration and thread management.

use thiserror::Error;

/// Errors produced by timer queue components.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue was built without the soft-delay floor.
    #[error("soft delay is disabled for queue `{0}`")]
    SoftDelayDisabled(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A consumer thread could not be spawned.
    #[error("failed to spawn consumer thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
