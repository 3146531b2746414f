//! Error types shared across ZoomCut crates.

use std::path::PathBuf;

/// Top-level error type for ZoomCut operations.
#[derive(Debug, thiserror::Error)]
pub enum ZoomcutError {
    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Compose error: {message}")]
    Compose { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Capability unavailable: {message}")]
    Capability { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ZoomcutError.
pub type ZoomcutResult<T> = Result<T, ZoomcutError>;

impl ZoomcutError {
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is the user cancelling, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
