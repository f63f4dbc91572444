//! Error types for Sidewave

use crate::types::WindowId;
use thiserror::Error;

/// Result type alias for Sidewave operations
pub type SidewaveResult<T> = Result<T, SidewaveError>;

/// Main error type for Sidewave
#[derive(Error, Debug)]
pub enum SidewaveError {
    #[error("Host API error: {0}")]
    Host(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Control channel error: {0}")]
    Channel(String),

    #[error("Control channel closed")]
    ChannelClosed,

    #[error("Action '{action}' failed: {message}")]
    Action { action: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Window identity has not been resolved yet")]
    MissingIdentity,

    #[error("Window identity already assigned to window {0}")]
    IdentityReassigned(WindowId),

    #[error("No handler registered for commands: {}", .0.join(", "))]
    UnknownCommands(Vec<String>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SidewaveError {
    /// Create a new host API error
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new control channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a new action error
    pub fn action(action: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Action {
            action: action.into(),
            message: msg.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
