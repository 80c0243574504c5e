//! The routing decision for one request.

use serde::{Deserialize, Serialize};

/// What the router decided to do with a request.
///
/// Every variant except `General` maps onto a registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Summarize {
        text: String,
    },
    Report {
        topic: String,
    },
    Scrape {
        url: String,
    },
    Email {
        subject: String,
        recipient: String,
        content: String,
    },
    /// Free-form chat answered by the general assistant prompt.
    General {
        request: String,
    },
}

impl Action {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summarize { .. } => "summarize",
            Self::Report { .. } => "report",
            Self::Scrape { .. } => "scrape",
            Self::Email { .. } => "email",
            Self::General { .. } => "general",
        }
    }

    /// Registry name of the tool that executes this action.
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Self::General { .. } => None,
            other => Some(other.label()),
        }
    }

    /// Tool parameters for this action.
    pub fn params(&self) -> serde_json::Value {
        match self {
            Self::Summarize { text } => serde_json::json!({ "text": text }),
            Self::Report { topic } => serde_json::json!({ "topic": topic }),
            Self::Scrape { url } => serde_json::json!({ "url": url }),
            Self::Email {
                subject,
                recipient,
                content,
            } => serde_json::json!({
                "subject": subject,
                "recipient": recipient,
                "content": content,
            }),
            Self::General { request } => serde_json::json!({ "request": request }),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_has_no_tool() {
        let action = Action::General {
            request: "hi".into(),
        };
        assert_eq!(action.tool_name(), None);
        assert_eq!(action.label(), "general");
    }

    #[test]
    fn email_params_carry_all_fields() {
        let action = Action::Email {
            subject: "Subj".into(),
            recipient: "to@x.com".into(),
            content: "Body".into(),
        };
        assert_eq!(action.tool_name(), Some("email"));
        let params = action.params();
        assert_eq!(params["subject"], "Subj");
        assert_eq!(params["recipient"], "to@x.com");
        assert_eq!(params["content"], "Body");
    }

    #[test]
    fn serializes_with_action_tag() {
        let action = Action::Scrape {
            url: "https://example.com".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "scrape");
        assert_eq!(json["url"], "https://example.com");
    }
}
