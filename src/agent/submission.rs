//! Submission types for the agent loop.
//!
//! A handful of slash commands control the session itself; everything else
//! is a request for the router.

/// Parses user input into Submission types.
pub struct SubmissionParser;

impl SubmissionParser {
    /// Parse message content into a Submission.
    pub fn parse(content: &str) -> Submission {
        let trimmed = content.trim();

        match trimmed.to_lowercase().as_str() {
            "/quit" | "/exit" => Submission::Quit,
            "/help" | "/?" => Submission::Help,
            "/history" => Submission::History,
            "/theme" => Submission::ToggleTheme,
            _ => Submission::UserInput {
                content: trimmed.to_string(),
            },
        }
    }
}

/// Types of submissions the agent can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A request to route (may be a directive such as `/summarize`).
    UserInput { content: String },
    /// Stop the agent loop.
    Quit,
    /// Show available commands.
    Help,
    /// Print the conversation so far.
    History,
    /// Switch between light and dark output.
    ToggleTheme,
}

impl Submission {
    /// Whether this submission goes to the router.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::UserInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_control_commands() {
        assert_eq!(SubmissionParser::parse("/quit"), Submission::Quit);
        assert_eq!(SubmissionParser::parse("  /EXIT "), Submission::Quit);
        assert_eq!(SubmissionParser::parse("/help"), Submission::Help);
        assert_eq!(SubmissionParser::parse("/history"), Submission::History);
        assert_eq!(SubmissionParser::parse("/theme"), Submission::ToggleTheme);
    }

    #[test]
    fn test_parser_user_input() {
        let submission = SubmissionParser::parse("  What is Rust?  ");
        assert_eq!(
            submission,
            Submission::UserInput {
                content: "What is Rust?".into()
            }
        );
        assert!(submission.is_user_input());
    }

    #[test]
    fn directives_pass_through_as_user_input() {
        assert!(SubmissionParser::parse("/summarize some text").is_user_input());
        assert!(SubmissionParser::parse("/theme dark please").is_user_input());
    }
}
