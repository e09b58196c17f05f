//! Error types for the audio graph and editor configuration

use thiserror::Error;

/// Errors reported by an audio backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The context refused to create a node
    #[error("Failed to create {kind} node: {reason}")]
    NodeCreation { kind: &'static str, reason: String },

    /// Wiring two nodes together failed
    #[error("Failed to connect audio nodes: {0}")]
    Connect(String),

    /// Dropping a node's outgoing edges failed
    #[error("Failed to disconnect audio node: {0}")]
    Disconnect(String),

    /// Resuming a suspended context was rejected
    #[error("Failed to resume audio context: {0}")]
    Resume(String),

    /// The media element rejected `play()`
    #[error("Playback rejected: {0}")]
    Play(String),

    /// The context was already closed
    #[error("Audio context is closed")]
    Closed,
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors raised while loading an [`EditorConfig`](crate::config::EditorConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
