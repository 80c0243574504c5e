//! Report generator.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::llm::{LlmProvider, Reasoning};
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

pub const REPORT_WRITER_PROMPT: &str =
    "You are a professional report writer. Create detailed and well-structured reports.";

pub struct ReportTool {
    reasoning: Reasoning,
}

impl ReportTool {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            reasoning: Reasoning::new(llm).with_system_prompt(REPORT_WRITER_PROMPT),
        }
    }

    pub async fn generate_report(&self, topic: &str) -> Result<String, ToolError> {
        let prompt = format!("Generate a brief report on the following topic: {topic}");
        Ok(self.reasoning.respond(&prompt).await?.text)
    }
}

#[async_trait]
impl Tool for ReportTool {
    fn name(&self) -> &str {
        "report"
    }

    fn description(&self) -> &str {
        "Write a brief, well-structured report on a topic."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The subject of the report"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let topic = require_str(&params, "topic")?;
        let start = Instant::now();
        let report = self.generate_report(topic).await?;
        Ok(ToolOutput::text(report, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{FailingLlm, RecordingLlm};

    #[tokio::test]
    async fn report_uses_writer_role_once() {
        let llm = Arc::new(RecordingLlm::replying("# Solar power\n..."));
        let tool = ReportTool::new(llm.clone());

        let output = tool
            .execute(serde_json::json!({"topic": "solar power adoption"}))
            .await
            .unwrap();
        assert!(output.content.starts_with("# Solar power"));

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].system_prompt().as_deref(),
            Some(REPORT_WRITER_PROMPT)
        );
        assert_eq!(
            requests[0].messages[1].content,
            "Generate a brief report on the following topic: solar power adoption"
        );
    }

    #[tokio::test]
    async fn report_propagates_backend_failure() {
        let tool = ReportTool::new(Arc::new(FailingLlm));
        assert!(matches!(
            tool.generate_report("x").await,
            Err(ToolError::Backend(_))
        ));
    }
}
