//! Error types for the headphone-model crate.

/// Errors raised while decoding or encoding a wire payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The payload was not a valid headphone event
    #[error("Malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The event could not be serialized
    #[error("Failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Convenience type alias for Results using PayloadError.
pub type Result<T> = std::result::Result<T, PayloadError>;
