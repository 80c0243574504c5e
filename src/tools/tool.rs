//! The `Tool` trait and its result types.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;

/// Why a scrape did not produce page text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeFailure {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("could not read response body: {0}")]
    Body(String),
}

/// Error returned by a tool. Every executor reports failure through this type.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Backend call failed: {0}")]
    Backend(#[from] LlmError),

    #[error("Failed to scrape website. ({0})")]
    Scrape(#[from] ScrapeFailure),
}

/// Successful tool result.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: String,
    pub duration: Duration,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>, duration: Duration) -> Self {
        Self {
            content: content.into(),
            duration,
        }
    }
}

/// A named action the router can dispatch to.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the `params` object accepted by `execute`.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError>;
}

/// Fetch a required string parameter.
pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' parameter", key)))
}
