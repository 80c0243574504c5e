//! Summarizer: condenses text through the model.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::llm::{LlmProvider, Reasoning};
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

pub const SUMMARIZER_PROMPT: &str = "You are an expert summarizer. Provide concise summaries.";

pub struct SummarizeTool {
    reasoning: Reasoning,
}

impl SummarizeTool {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            reasoning: Reasoning::new(llm).with_system_prompt(SUMMARIZER_PROMPT),
        }
    }

    /// Summarize `text` in a few sentences. One backend call; failures propagate.
    pub async fn summarize(&self, text: &str) -> Result<String, ToolError> {
        let prompt = format!("Summarize the following text in a few sentences: {text}");
        Ok(self.reasoning.respond(&prompt).await?.text)
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize"
    }

    fn description(&self) -> &str {
        "Summarize a piece of text in a few concise sentences."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to summarize"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let text = require_str(&params, "text")?;
        let start = Instant::now();
        let summary = self.summarize(text).await?;
        Ok(ToolOutput::text(summary, start.elapsed()))
    }
}
