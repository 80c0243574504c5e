//! Email drafter. The address is passed through unvalidated.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::llm::{LlmProvider, Reasoning};
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

pub const EMAIL_WRITER_PROMPT: &str =
    "You are an expert email writer. Write professional and concise emails.";

pub struct EmailDraftTool {
    reasoning: Reasoning,
}

impl EmailDraftTool {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            reasoning: Reasoning::new(llm).with_system_prompt(EMAIL_WRITER_PROMPT),
        }
    }

    pub async fn write_email(
        &self,
        subject: &str,
        recipient: &str,
        content: &str,
    ) -> Result<String, ToolError> {
        let prompt = build_email_prompt(subject, recipient, content);
        Ok(self.reasoning.respond(&prompt).await?.text)
    }
}

fn build_email_prompt(subject: &str, recipient: &str, content: &str) -> String {
    format!(
        "Write an email with the following details:\n\
         Subject: {subject}\n\
         Recipient: {recipient}\n\
         Content: {content}"
    )
}

#[async_trait]
impl Tool for EmailDraftTool {
    fn name(&self) -> &str {
        "email"
    }

    fn description(&self) -> &str {
        "Draft a professional email from a subject, a recipient, and the points to cover."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "recipient": {
                    "type": "string",
                    "description": "Who the email is addressed to"
                },
                "content": {
                    "type": "string",
                    "description": "What the email should say"
                }
            },
            "required": ["subject", "recipient", "content"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let subject = require_str(&params, "subject")?;
        let recipient = require_str(&params, "recipient")?;
        let content = require_str(&params, "content")?;

        let start = Instant::now();
        let email = self.write_email(subject, recipient, content).await?;
        Ok(ToolOutput::text(email, start.elapsed()))
    }
}
