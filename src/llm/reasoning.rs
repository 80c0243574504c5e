//! Reasoning layer: a provider paired with a fixed role instruction.
//!
//! Every executor and the general-purpose router path goes through
//! `Reasoning::respond`, which is one system + user prompt and one backend call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};

/// Token usage from an LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Output from a `respond` call.
#[derive(Debug, Clone)]
pub struct RespondOutput {
    pub text: String,
    pub usage: TokenUsage,
}

/// Reasoning layer that wraps an LLM provider.
#[derive(Clone)]
pub struct Reasoning {
    llm: Arc<dyn LlmProvider>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Reasoning {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Send `prompt` under the configured system prompt. Failures are returned, never retried.
    pub async fn respond(&self, prompt: &str) -> Result<RespondOutput, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let mut request = CompletionRequest::new(messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        debug!(
            model = self.llm.model_name(),
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        let response = self.llm.complete(request).await?;
        let usage = TokenUsage {
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        };

        if response.finish_reason == FinishReason::Length {
            warn!(
                model = self.llm.model_name(),
                max_tokens = ?self.max_tokens,
                "Completion stopped at the token limit"
            );
        }

        info!(
            model = self.llm.model_name(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost_usd = %self.llm.estimate_cost(usage.input_tokens, usage.output_tokens),
            "Completion finished"
        );

        Ok(RespondOutput {
            text: response.content,
            usage,
        })
    }
}
