//! Error types shared across Livecheck crates.

use std::path::PathBuf;

/// Top-level error type for Livecheck operations.
#[derive(Debug, thiserror::Error)]
pub enum LivecheckError {
    /// The session carries no usable frames (missing/empty list, or no
    /// frame with landmark data).
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Fewer usable frames than the pipeline needs after alignment.
    #[error("Insufficient sequence: {frames} usable frame(s), at least {minimum} required")]
    InsufficientSequence { frames: usize, minimum: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Scoring error: {message}")]
    Scoring { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LivecheckError.
pub type LivecheckResult<T> = Result<T, LivecheckError>;

impl LivecheckError {
    pub fn malformed_input(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn insufficient_sequence(frames: usize, minimum: usize) -> Self {
        Self::InsufficientSequence { frames, minimum }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn scoring(msg: impl Into<String>) -> Self {
        Self::Scoring {
            message: msg.into(),
        }
    }

    /// Whether the error means "not enough data" rather than a fault.
    ///
    /// Callers surface these as a rejected request, never as a crash.
    pub fn is_client_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::InsufficientSequence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(LivecheckError::malformed_input("no frames").is_client_rejection());
        assert!(LivecheckError::insufficient_sequence(3, 5).is_client_rejection());
        assert!(!LivecheckError::config("bad").is_client_rejection());
        assert!(!LivecheckError::scoring("interpreter gone").is_client_rejection());
    }

    #[test]
    fn test_insufficient_sequence_message() {
        let err = LivecheckError::insufficient_sequence(3, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient sequence: 3 usable frame(s), at least 5 required"
        );
    }
}
