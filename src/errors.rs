//! Error types for nearsat

use thiserror::Error;

/// Main error type for nearsat functionality
#[derive(Error, Debug)]
pub enum NearsatError {
    /// Element feed fetch or connectivity probe failed
    #[error("Network error: {0}")]
    Network(String),

    /// Persistence failure in the element store
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the store location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An element pair could not be turned into a propagatable state
    #[error("Invalid element set: {0}")]
    InvalidElements(String),

    /// The SGP4 model reported a non-zero status
    #[error("Propagation failed with status {code}: {message}")]
    Propagation { code: i32, message: String },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for nearsat operations
pub type Result<T> = std::result::Result<T, NearsatError>;

impl From<reqwest::Error> for NearsatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NearsatError::Network(format!("request timed out: {}", err))
        } else {
            NearsatError::Network(err.to_string())
        }
    }
}
