//! Error types for codecs

/// Failure raised by a codec while encoding or decoding a payload.
///
/// Drivers never swallow these: a failing codec fails the `poll` or `send`
/// that invoked it.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("JSON codec failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML codec failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid UTF-8 payload: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Raised by user-supplied codec functions
    #[error("Codec failed: {0}")]
    Custom(String),
}

impl From<std::string::FromUtf8Error> for SerializationError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        SerializationError::Utf8(err.utf8_error())
    }
}
