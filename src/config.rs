//! Configuration types.

use std::time::Duration;

use crate::agent::session::Theme;
use crate::error::ConfigError;

/// General assistant instruction used for requests that no rule classifies.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant capable of summarizing texts, \
generating reports, web scraping, writing emails, and performing other basic tasks. \
Respond to the user's request and call the appropriate function if needed.";

/// Default number of characters kept from a scraped page.
pub const DEFAULT_SCRAPE_MAX_CHARS: usize = 1000;

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent name for identification.
    pub name: String,
    /// System prompt for general requests.
    pub system_prompt: String,
    /// Ask the model to classify requests that no directive rule matches.
    pub llm_triage: bool,
    /// Characters kept from the body text of a scraped page.
    pub scrape_max_chars: usize,
    /// Timeout for scrape requests. `None` keeps the HTTP client default.
    pub http_timeout: Option<Duration>,
    /// Initial presentation theme.
    pub theme: Theme,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "ai-agent".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            llm_triage: false,
            scrape_max_chars: DEFAULT_SCRAPE_MAX_CHARS,
            http_timeout: None,
            theme: Theme::Light,
        }
    }
}

impl AgentConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let system_prompt = lookup("AI_AGENT_SYSTEM_PROMPT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.system_prompt);

        let llm_triage = match lookup("AI_AGENT_LLM_TRIAGE") {
            Some(raw) => parse_bool("AI_AGENT_LLM_TRIAGE", &raw)?,
            None => defaults.llm_triage,
        };

        let scrape_max_chars = match lookup("AI_AGENT_SCRAPE_MAX_CHARS") {
            Some(raw) => parse_positive("AI_AGENT_SCRAPE_MAX_CHARS", &raw)? as usize,
            None => defaults.scrape_max_chars,
        };

        let http_timeout = lookup("AI_AGENT_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_positive("AI_AGENT_HTTP_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let theme = match lookup("AI_AGENT_THEME") {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "AI_AGENT_THEME".into(),
                message,
            })?,
            None => defaults.theme,
        };

        Ok(Self {
            name: defaults.name,
            system_prompt,
            llm_triage,
            scrape_max_chars,
            http_timeout,
            theme,
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: "must be greater than zero".into(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: e.to_string(),
        }),
    }
}
