//! Stub providers shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

enum Reply {
    Fixed(String),
    Scripted(Mutex<VecDeque<String>>),
    /// Return the user prompt verbatim.
    Echo,
}

/// Provider that records every request and answers without touching the network.
pub struct RecordingLlm {
    reply: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingLlm {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Fixed(text.to_string()))
    }

    /// Answers in order; returns an error once the script runs out.
    pub fn scripted(replies: &[&str]) -> Self {
        Self::with_reply(Reply::Scripted(Mutex::new(
            replies.iter().map(|r| r.to_string()).collect(),
        )))
    }

    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    fn model_name(&self) -> &str {
        "recording"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let content = match &self.reply {
            Reply::Fixed(text) => text.clone(),
            Reply::Echo => prompt,
            Reply::Scripted(queue) => {
                queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| LlmError::RequestFailed {
                        provider: "recording".into(),
                        reason: "script exhausted".into(),
                    })?
            }
        };

        Ok(CompletionResponse {
            content,
            input_tokens: 10,
            output_tokens: 5,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

/// Provider whose every call fails.
pub struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "failing".into(),
            reason: "backend unavailable".into(),
        })
    }
}

/// Provider that never answers within a test's lifetime.
pub struct StalledLlm;

#[async_trait]
impl LlmProvider for StalledLlm {
    fn model_name(&self) -> &str {
        "stalled"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(LlmError::RequestFailed {
            provider: "stalled".into(),
            reason: "gave up".into(),
        })
    }
}
