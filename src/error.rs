//! Error types for the agent.

use std::time::Duration;

pub use crate::tools::tool::{ScrapeFailure, ToolError};

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid request for {provider}: {reason}")]
    InvalidRequest { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Failures while turning a request into a response.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Backend call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("Action {action} failed: {source}")]
    Action {
        action: &'static str,
        #[source]
        source: ToolError,
    },
}

/// Conversation session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A request is already awaiting a response")]
    Busy,

    #[error("Pending turn {0} does not belong to this session")]
    UnknownTurn(uuid::Uuid),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
