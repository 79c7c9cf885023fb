//! Error types for the healthbuddy assistant service.
//!
//! One crate-wide enum; every boundary failure is converted here and then
//! mapped to a user-visible message at the handler that hit it.

use thiserror::Error;

/// Main error type for the assistant service
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Model download or construction failures (startup only)
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Tokenization failures
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Forward-pass or span-extraction failures
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Audio capture errors (device missing, stream build failed)
    #[error("Audio capture error: {0}")]
    Capture(String),

    /// Captured audio contained no recognizable speech
    #[error("Captured audio was not recognizable as speech")]
    Unintelligible,

    /// Transcription service unreachable or returned an error
    #[error("Speech recognition service error: {0}")]
    TranscriptionService(String),

    /// Health report parsing or analysis errors
    #[error("Health report error: {0}")]
    Report(String),

    /// Chart rendering errors
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Convert anyhow errors from loader code into the crate error
impl From<anyhow::Error> for AssistantError {
    fn from(err: anyhow::Error) -> Self {
        AssistantError::ModelLoad(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_display() {
        let err =
            AssistantError::Report("non-numeric value in column 'Heart Rate' at line 3".to_string());
        assert!(err.to_string().contains("Heart Rate"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_unintelligible_is_distinct_from_service_error() {
        let a = AssistantError::Unintelligible;
        let b = AssistantError::TranscriptionService("connection refused".to_string());
        assert_ne!(a.to_string(), b.to_string());
    }
}
