//! Tool registry for managing available actions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::AgentConfig;
use crate::llm::LlmProvider;
use crate::tools::builtin::{EmailDraftTool, ReportTool, ScrapeTool, SummarizeTool};
use crate::tools::tool::Tool;

/// Names of built-in tools that cannot be shadowed by dynamic registrations.
const PROTECTED_TOOL_NAMES: &[&str] = &["summarize", "report", "scrape", "email"];

/// Name, description and parameter schema of a tool, as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters_schema(),
        }
    }
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    /// Tracks which names were registered as built-in (protected from shadowing).
    builtin_names: RwLock<HashSet<String>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            builtin_names: RwLock::new(HashSet::new()),
        }
    }

    /// Registry holding the four built-in executors.
    pub fn with_builtins(
        llm: Arc<dyn LlmProvider>,
        config: &AgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let registry = Self::new();
        registry.register_sync(Arc::new(SummarizeTool::new(Arc::clone(&llm))));
        registry.register_sync(Arc::new(ReportTool::new(Arc::clone(&llm))));
        registry.register_sync(Arc::new(EmailDraftTool::new(llm)));
        registry.register_sync(Arc::new(ScrapeTool::new(
            config.scrape_max_chars,
            config.http_timeout,
        )?));
        Ok(registry)
    }

    /// Register a tool. Rejects dynamic tools that try to shadow a built-in name.
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.builtin_names.read().await.contains(&name) {
            tracing::warn!(
                tool = %name,
                "Rejected tool registration: would shadow a built-in tool"
            );
            return;
        }
        self.tools.write().await.insert(name.clone(), tool);
        tracing::debug!("Registered tool: {}", name);
    }

    /// Register a tool (sync version for startup, marks as built-in).
    pub fn register_sync(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if let Ok(mut tools) = self.tools.try_write() {
            tools.insert(name.clone(), tool);
            if PROTECTED_TOOL_NAMES.contains(&name.as_str())
                && let Ok(mut builtins) = self.builtin_names.try_write()
            {
                builtins.insert(name.clone());
            }
            tracing::debug!("Registered tool: {}", name);
        }
    }

    /// Get a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    /// Check if a tool exists.
    pub async fn has(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// List all tool names, sorted.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.try_read().map(|t| t.len()).unwrap_or(0)
    }

    /// Definitions of every registered tool, sorted by name.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| ToolDefinition::of(tool.as_ref()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::RecordingLlm;
    use crate::tools::tool::{ToolError, ToolOutput};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct MockTool {
        name: String,
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.name
        }
        fn description(&self) -> &str {
            "A mock tool for testing"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: serde_json::Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("mock", Duration::from_millis(1)))
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ToolRegistry::new();
        let tool = Arc::new(MockTool {
            name: "test_tool".to_string(),
        });

        registry.register(tool).await;
        assert!(registry.has("test_tool").await);
        assert!(!registry.has("nonexistent").await);

        let retrieved = registry.get("test_tool").await;
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().name(), "test_tool");
    }

    #[tokio::test]
    async fn builtins_are_registered_and_protected() {
        let llm = Arc::new(RecordingLlm::replying("unused"));
        let registry = ToolRegistry::with_builtins(llm, &AgentConfig::default()).unwrap();
        assert_eq!(registry.count(), 4);
        assert_eq!(
            registry.list().await,
            vec!["email", "report", "scrape", "summarize"]
        );

        registry
            .register(Arc::new(MockTool {
                name: "scrape".to_string(),
            }))
            .await;
        let scrape = registry.get("scrape").await.unwrap();
        assert_eq!(scrape.description(), "Fetch a web page and return the beginning of its visible text.");
    }

    #[tokio::test]
    async fn test_tool_definitions_sorted() {
        let registry = ToolRegistry::new();
        for name in ["b_tool", "a_tool"] {
            registry
                .register(Arc::new(MockTool {
                    name: name.to_string(),
                }))
                .await;
        }

        let defs = registry.tool_definitions().await;
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "a_tool");
        assert_eq!(defs[1].description, "A mock tool for testing");
    }
}
