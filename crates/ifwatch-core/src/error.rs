//! Error types for ifwatch
//!
//! This module defines the error type shared by the library and both binaries.

use thiserror::Error;

/// Result type alias for ifwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ifwatch
#[derive(Error, Debug)]
pub enum Error {
    /// Notification channel errors (open, bind, read)
    #[error("Notification channel error: {0}")]
    Channel(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to start the configured action
    #[error("Failed to spawn action: {0}")]
    Spawn(String),

    /// The watcher process closed its output
    #[error("Watcher exited: {0}")]
    WatcherExited(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a notification channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Create a watcher-exited error
    pub fn watcher_exited(msg: impl Into<String>) -> Self {
        Self::WatcherExited(msg.into())
    }
}
