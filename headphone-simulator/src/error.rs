//! Error types for the headphone-simulator crate.

use thiserror::Error;

/// Errors that can occur while configuring or starting the generator
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Invalid generator configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `start` was called outside a tokio runtime
    #[error("No async runtime available: {0}")]
    Runtime(String),
}

/// Convenience type alias for Results using GeneratorError.
pub type Result<T> = std::result::Result<T, GeneratorError>;
