//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message};
use rig::message::AssistantContent;
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::costs;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// An `LlmProvider` backed by any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
    M::Response: Send + Sync,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        costs::model_cost(&self.model_name).unwrap_or_else(costs::default_cost)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let preamble = request.system_prompt();
        let (prompt, history) =
            split_prompt_and_history(&request.messages).ok_or_else(|| LlmError::InvalidRequest {
                provider: self.provider.to_string(),
                reason: "request has no user message".to_string(),
            })?;

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = self
            .model
            .completion(builder.build())
            .await
            .map_err(|e| classify_error(self.provider, &e.to_string()))?;

        let texts: Vec<&str> = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);

        Ok(CompletionResponse {
            content: texts.join(""),
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens,
            finish_reason: infer_finish_reason(request.max_tokens, output_tokens, !texts.is_empty()),
            response_id: None,
        })
    }
}

/// Split non-system messages into the final user prompt and the preceding history.
fn split_prompt_and_history(messages: &[ChatMessage]) -> Option<(Message, Vec<Message>)> {
    let conversational: Vec<&ChatMessage> =
        messages.iter().filter(|m| m.role != Role::System).collect();
    let (last, earlier) = conversational.split_last()?;
    if last.role != Role::User {
        return None;
    }

    let history = earlier
        .iter()
        .map(|m| match m.role {
            Role::Assistant => Message::assistant(m.content.clone()),
            _ => Message::user(m.content.clone()),
        })
        .collect();

    Some((Message::user(last.content.clone()), history))
}

/// rig does not expose the provider's stop reason, so derive it from usage:
/// no text at all is `Unknown`, hitting the requested cap is `Length`.
fn infer_finish_reason(max_tokens: Option<u32>, output_tokens: u32, has_text: bool) -> FinishReason {
    if !has_text {
        FinishReason::Unknown
    } else if max_tokens.is_some_and(|max| output_tokens >= max) {
        FinishReason::Length
    } else {
        FinishReason::Stop
    }
}

/// Map a provider error message onto our error taxonomy.
fn classify_error(provider: &str, reason: &str) -> LlmError {
    let lower = reason.to_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("invalid api key")
    {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }
}
