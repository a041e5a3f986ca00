use dhv_core::{NetworkError, StorageError};
use thiserror::Error;

/// Why a single refresh attempt failed
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Fetch failed: {0}")]
    Network(#[from] NetworkError),

    #[error("Page contained no usable regions")]
    EmptySnapshot,

    #[error("Persisting snapshot failed: {0}")]
    Storage(#[from] StorageError),
}

impl RefreshError {
    /// Only a malformed source URL ends the run early.
    pub fn is_retryable(&self) -> bool {
        match self {
            RefreshError::Network(e) => e.is_retryable(),
            RefreshError::EmptySnapshot | RefreshError::Storage(_) => true,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RefreshError::Network(e) => e.user_message(),
            RefreshError::EmptySnapshot => "No forecast found on the weather page.",
            RefreshError::Storage(e) => e.user_message(),
        }
    }
}
