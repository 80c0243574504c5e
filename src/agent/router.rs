//! Request router: turns one free-text request into an `Action` and runs it.
//!
//! Flow:
//! 1. Rules engine (fast, no LLM) → may short-circuit
//! 2. Optional LLM triage → structured JSON decision
//! 3. Fallback → `Action::General`, answered by the general system prompt
//!
//! The router never retries and never recovers locally: backend and tool
//! failures are returned to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::agent::action::Action;
use crate::agent::rules::RulesEngine;
use crate::config::AgentConfig;
use crate::error::{RouteError, ToolError};
use crate::llm::{LlmProvider, Reasoning};
use crate::tools::registry::{ToolDefinition, ToolRegistry};

/// Max tokens for the triage LLM call.
const TRIAGE_MAX_TOKENS: u32 = 512;

/// Temperature for triage (deterministic-ish).
const TRIAGE_TEMPERATURE: f32 = 0.0;

/// Which stage produced the routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Rules,
    Triage,
    Fallback,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Triage => "llm",
            Self::Fallback => "fallback",
        }
    }
}

/// A routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: Action,
    pub source: RouteSource,
}

/// Result of routing one request.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub action: Action,
    pub source: RouteSource,
    pub response: String,
    pub elapsed: Duration,
}

/// Hooks invoked while a request is routed. All methods default to no-ops.
#[async_trait]
pub trait RouteObserver: Send + Sync {
    /// Before classification.
    async fn on_request(&self, _request: &str) {}

    async fn on_classified(&self, _classification: &Classification) {}

    /// After the action ran, with its text or error.
    async fn on_executed(&self, _action: &Action, _result: Result<&str, &RouteError>) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

#[async_trait]
impl RouteObserver for NoopObserver {}

pub struct Router {
    general: Reasoning,
    triage: Option<Reasoning>,
    rules: RulesEngine,
    tools: Arc<ToolRegistry>,
}

impl Router {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: &AgentConfig) -> Self {
        let triage = config.llm_triage.then(|| {
            Reasoning::new(Arc::clone(&llm))
                .with_temperature(TRIAGE_TEMPERATURE)
                .with_max_tokens(TRIAGE_MAX_TOKENS)
        });

        Self {
            general: Reasoning::new(llm).with_system_prompt(config.system_prompt.clone()),
            triage,
            rules: RulesEngine::default_rules(),
            tools,
        }
    }

    pub fn with_rules(mut self, rules: RulesEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Decide what to do with `request` without executing it.
    pub async fn classify(&self, request: &str) -> Result<Classification, RouteError> {
        if let Some(action) = self.rules.evaluate(request) {
            return Ok(Classification {
                action,
                source: RouteSource::Rules,
            });
        }

        if let Some(ref triage) = self.triage {
            let definitions = self.tools.tool_definitions().await;
            let triage = triage
                .clone()
                .with_system_prompt(build_triage_system_prompt(&definitions));
            let output = triage.respond(request).await?;

            match parse_triage_response(&output.text, request) {
                Ok(action) => {
                    return Ok(Classification {
                        action,
                        source: RouteSource::Triage,
                    });
                }
                Err(e) => {
                    warn!(
                        raw_response = %output.text,
                        error = %e,
                        "Failed to parse triage response, falling back to general"
                    );
                }
            }
        }

        Ok(Classification {
            action: Action::General {
                request: request.to_string(),
            },
            source: RouteSource::Fallback,
        })
    }

    /// Run a decided action and return its text.
    pub async fn execute(&self, action: &Action) -> Result<String, RouteError> {
        let tool_name = match action {
            Action::General { request } => return Ok(self.general.respond(request).await?.text),
            _ => action.label(),
        };

        let tool = self
            .tools
            .get(tool_name)
            .await
            .ok_or_else(|| RouteError::Action {
                action: action.label(),
                source: ToolError::NotFound(tool_name.to_string()),
            })?;

        let output = tool
            .execute(action.params())
            .await
            .map_err(|source| RouteError::Action {
                action: action.label(),
                source,
            })?;
        Ok(output.content)
    }

    /// Classify and execute one request.
    pub async fn route(&self, request: &str) -> Result<RouteOutcome, RouteError> {
        self.route_observed(request, &NoopObserver).await
    }

    /// `route`, reporting progress to `observer`.
    pub async fn route_observed(
        &self,
        request: &str,
        observer: &dyn RouteObserver,
    ) -> Result<RouteOutcome, RouteError> {
        let start = Instant::now();
        observer.on_request(request).await;
        let classification = self.classify(request).await?;
        info!(
            action = classification.action.label(),
            source = classification.source.as_str(),
            "Routing request"
        );
        observer.on_classified(&classification).await;

        let Classification { action, source } = classification;
        let result = self.execute(&action).await;
        observer.on_executed(&action, result.as_deref()).await;
        let response = result?;
        let elapsed = start.elapsed();
        info!(
            action = action.label(),
            elapsed_ms = elapsed.as_millis() as u64,
            response_chars = response.chars().count(),
            "Request handled"
        );

        Ok(RouteOutcome {
            action,
            source,
            response,
            elapsed,
        })
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the triage system prompt from the registered tools.
fn build_triage_system_prompt(definitions: &[ToolDefinition]) -> String {
    let mut prompt = String::from(
        "You are a request router for an assistant. Choose the single action that best \
         serves the user's request.\n\nActions:\n",
    );
    for def in definitions {
        prompt.push_str(&format!(
            "- \"{}\": {} Parameters: {}\n",
            def.name, def.description, def.parameters
        ));
    }
    prompt.push_str(
        "- \"general\": anything else. No parameters.\n\n\
         Respond with ONLY a JSON object containing \"action\" and that action's parameters, e.g.\n\
         {\"action\": \"scrape\", \"url\": \"https://example.com\"}\n\n\
         Rules:\n\
         - Only pick a non-general action when every required parameter is present in the request\n\
         - Copy parameter values from the request; do not invent them\n\
         - When in doubt, choose general",
    );
    prompt
}

// ── Response parsing ────────────────────────────────────────────────

/// LLM triage response structure.
#[derive(Debug, serde::Deserialize)]
struct TriageResponse {
    action: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    recipient: String,
    #[serde(default)]
    content: String,
}

fn required(field: &str, value: String) -> Result<String, String> {
    if value.trim().is_empty() {
        Err(format!("missing '{field}' field"))
    } else {
        Ok(value)
    }
}

/// Parse the LLM triage response into an `Action`.
fn parse_triage_response(raw: &str, request: &str) -> Result<Action, String> {
    let json_str = extract_json_object(raw);
    let response: TriageResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    match response.action.trim().to_lowercase().as_str() {
        "summarize" => Ok(Action::Summarize {
            text: required("text", response.text)?,
        }),
        "report" => Ok(Action::Report {
            topic: required("topic", response.topic)?,
        }),
        "scrape" => Ok(Action::Scrape {
            url: required("url", response.url)?,
        }),
        "email" => Ok(Action::Email {
            subject: required("subject", response.subject)?,
            recipient: required("recipient", response.recipient)?,
            content: required("content", response.content)?,
        }),
        "general" => Ok(Action::General {
            request: request.to_string(),
        }),
        other => Err(format!("unknown action: '{other}'")),
    }
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
