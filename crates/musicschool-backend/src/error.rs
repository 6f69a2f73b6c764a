use thiserror::Error;

/// Errors produced by a document store.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached (offline, timeout, ...).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Documents must be JSON objects.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Failure inside the storage engine of a local backend.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BackendError>;
