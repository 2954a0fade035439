//! Error types shared across ScreenVerse crates.

use std::path::PathBuf;

/// Top-level error type for ScreenVerse operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenverseError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Clip store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// The encoder finished without producing any bytes.
    #[error("Export produced no data: {message}")]
    EmptyExport { message: String },

    #[error("Export cancelled after {frames_rendered} frames")]
    ExportCancelled { frames_rendered: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScreenverseError.
pub type ScreenverseResult<T> = Result<T, ScreenverseError>;

impl ScreenverseError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn empty_export(msg: impl Into<String>) -> Self {
        Self::EmptyExport {
            message: msg.into(),
        }
    }

    /// Whether retrying the same operation can reasonably succeed.
    ///
    /// Permission and capture failures are user-recoverable; structural
    /// failures (bad input, empty output) need a different input first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Capture { .. } | Self::PermissionDenied { .. } | Self::ExportCancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_include_context() {
        let err = ScreenverseError::empty_export("zero chunks");
        assert_eq!(err.to_string(), "Export produced no data: zero chunks");

        let err = ScreenverseError::ExportCancelled { frames_rendered: 12 };
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ScreenverseError::permission_denied("denied").is_retryable());
        assert!(!ScreenverseError::render("bad").is_retryable());
        assert!(!ScreenverseError::empty_export("none").is_retryable());
    }
}
