//! Error types for the application.

use serenity::model::id::ChannelId;
use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Forwarding error: {0}")]
    Forward(#[from] ForwardError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Route store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An admin operation referenced a source with no route.
    #[error("Unknown source channel: {source_id}")]
    UnknownSource { source_id: ChannelId },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Stored channel id '{value}' is not a valid id")]
    CorruptId { value: String },

    #[error("Route store lock poisoned")]
    LockPoisoned,

    #[error("Route store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors raised while relaying a single message.
///
/// None of these are fatal; the event loop logs them and moves on.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Target channel {channel_id} could not be resolved")]
    TargetUnresolvable { channel_id: ChannelId },

    #[error("Target channel {channel_id} is a {kind} channel, not a text channel or thread")]
    InvalidTarget { channel_id: ChannelId, kind: String },

    #[error("Failed to send to channel {channel_id}: {message}")]
    SendFailed { channel_id: ChannelId, message: String },
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for route store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for forwarding operations.
pub type ForwardResult<T> = std::result::Result<T, ForwardError>;
