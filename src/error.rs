//! Error types
//!
//! State-machine operations never fail; these cover the edges around it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommunicatorError {
    #[error("Failed to read config '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {message}")]
    ConfigValue { field: &'static str, message: String },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Failure reported by a tone/vibration sink. Logged and dropped by the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Output device unavailable: {0}")]
    Unavailable(String),

    #[error("Playback failed: {0}")]
    Playback(String),
}

pub type Result<T> = std::result::Result<T, CommunicatorError>;
