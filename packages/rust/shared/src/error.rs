//! Error types for docbundle.
//!
//! Library crates use [`DocBundleError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only run-level failures are errors. A single unreadable file or a failed
//! fetch never becomes a `DocBundleError`; it is folded into an
//! [`ExtractionResult`](crate::ExtractionResult) instead.

use std::path::PathBuf;

/// Top-level error type for all docbundle operations.
#[derive(Debug, thiserror::Error)]
pub enum DocBundleError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The input source is unusable (missing directory, malformed seed URL).
    #[error("invalid source: {message}")]
    InvalidSource { message: String },

    /// Network/HTTP error during a crawl.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Format-specific parser failure.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocBundleError>;

impl DocBundleError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-source error from any displayable message.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
