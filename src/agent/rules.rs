//! Pre-LLM rules engine for explicit action directives.
//!
//! Runs before any model call so that obvious requests never cost a
//! classification round trip:
//! - `/summarize <text>` → Summarize
//! - `/report <topic>` → Report
//! - `/scrape <url>`, `scrape <url>`, `fetch <url>` → Scrape
//! - `/email <subject> | <recipient> | <content>` → Email
//!
//! Only explicit forms are matched; prose that merely starts with "summarize"
//! or "report on" is chat. If no rule returns an `Action`, the router falls
//! through to triage or general chat.

use regex::{Captures, Regex};
use tracing::debug;

use crate::agent::action::Action;

/// A directive rule: a pattern plus a builder for the resulting action.
pub struct DirectiveRule {
    /// Human-readable pattern description.
    pub pattern: String,
    regex: Regex,
    build: fn(&Captures) -> Option<Action>,
}

impl DirectiveRule {
    pub fn new(
        pattern: &str,
        regex: &str,
        build: fn(&Captures) -> Option<Action>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: pattern.into(),
            regex: Regex::new(regex)?,
            build,
        })
    }
}

/// Pre-LLM rules engine for fast routing.
pub struct RulesEngine {
    rules: Vec<DirectiveRule>,
}

impl RulesEngine {
    /// Create a rules engine with the default directives.
    pub fn default_rules() -> Self {
        let rules = vec![
            DirectiveRule::new(
                "/summarize <text>",
                r"(?is)^\s*/summari[sz]e\s+(.+?)\s*$",
                |caps| non_empty(&caps[1]).map(|text| Action::Summarize { text }),
            ),
            DirectiveRule::new(
                "/report <topic>",
                r"(?is)^\s*/report\s+(.+?)\s*$",
                |caps| non_empty(&caps[1]).map(|topic| Action::Report { topic }),
            ),
            DirectiveRule::new(
                "/scrape <url>",
                r"(?i)^\s*(?:/scrape|(?:please\s+)?(?:scrape|fetch))\s+(https?://\S+)\s*$",
                |caps| {
                    Some(Action::Scrape {
                        url: caps[1].to_string(),
                    })
                },
            ),
            DirectiveRule::new(
                "/scrape <anything>",
                r"(?i)^\s*/scrape\s+(\S+)\s*$",
                |caps| {
                    Some(Action::Scrape {
                        url: caps[1].to_string(),
                    })
                },
            ),
            DirectiveRule::new(
                "/email <subject> | <recipient> | <content>",
                r"(?is)^\s*/email\s+(.+)$",
                |caps| parse_email_fields(&caps[1]),
            ),
        ];

        Self {
            rules: rules
                .into_iter()
                .map(|r| r.expect("built-in directive patterns are valid"))
                .collect(),
        }
    }

    /// Create an empty rules engine (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom directive rule, evaluated after the existing ones.
    pub fn add_rule(&mut self, rule: DirectiveRule) {
        self.rules.push(rule);
    }

    /// Evaluate a request against all rules.
    ///
    /// Returns `Some(Action)` on the first match, `None` when nothing matches.
    pub fn evaluate(&self, request: &str) -> Option<Action> {
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(request) else {
                continue;
            };
            if let Some(action) = (rule.build)(&caps) {
                debug!(
                    rule = %rule.pattern,
                    action = action.label(),
                    "Request matched directive rule"
                );
                return Some(action);
            }
        }
        None
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `subject | recipient | content`; the content may itself contain `|`.
fn parse_email_fields(raw: &str) -> Option<Action> {
    let mut parts = raw.splitn(3, '|').map(str::trim);
    let subject = parts.next()?.to_string();
    let recipient = parts.next()?.to_string();
    let content = parts.next()?.to_string();
    Some(Action::Email {
        subject,
        recipient,
        content,
    })
}
