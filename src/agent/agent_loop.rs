//! Main agent loop.
//!
//! Reads messages from one channel and handles them strictly one at a time:
//! a message is fully answered (or failed) before the next is read, so turns
//! land in the conversation in submission order.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::agent::action::Action;
use crate::agent::router::{Classification, RouteObserver, Router};
use crate::agent::session::{Role, Session};
use crate::agent::submission::{Submission, SubmissionParser};
use crate::channels::{Channel, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::config::AgentConfig;
use crate::error::{Error, RouteError};

const HELP_TEXT: &str = "\
Commands:
  /summarize <text>                            summarize a passage
  /report <topic>                              write a brief report
  /scrape <url>                                fetch the text of a web page
  /email <subject> | <recipient> | <content>   draft an email
  /history                                     show the conversation
  /theme                                       toggle light/dark output
  /help                                        show this help
  /quit                                        exit
Anything else is answered by the assistant.";

/// Collapse a tool output string into a single-line preview for display.
pub fn truncate_for_preview(output: &str, max_chars: usize) -> String {
    let collapsed = output.split_whitespace().collect::<Vec<_>>().join(" ");
    // char_indices gives us byte offsets at char boundaries, so the slice is always valid UTF-8.
    match collapsed.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => format!("{}...", &collapsed[..byte_offset]),
        None => collapsed,
    }
}

async fn send_status(channel: &dyn Channel, status: StatusUpdate, metadata: &serde_json::Value) {
    if let Err(e) = channel.send_status(status, metadata).await {
        tracing::debug!("Failed to send status: {}", e);
    }
}

/// Relays routing progress to the channel that sent the message.
/// Chat replies get only the thinking notice; tool actions also get start and completion.
struct ChannelProgress<'a> {
    channel: &'a dyn Channel,
    metadata: &'a serde_json::Value,
}

#[async_trait]
impl RouteObserver for ChannelProgress<'_> {
    async fn on_request(&self, _request: &str) {
        send_status(self.channel, StatusUpdate::Thinking("Thinking...".into()), self.metadata).await;
    }

    async fn on_classified(&self, classification: &Classification) {
        let action = &classification.action;
        if !matches!(action, Action::General { .. }) {
            let status = StatusUpdate::ActionStarted {
                action: action.label().to_string(),
            };
            send_status(self.channel, status, self.metadata).await;
        }
    }

    async fn on_executed(&self, action: &Action, result: Result<&str, &RouteError>) {
        if let Ok(text) = result {
            tracing::debug!(preview = %truncate_for_preview(text, 80), "Action output");
        }
        if !matches!(action, Action::General { .. }) {
            let status = StatusUpdate::ActionCompleted {
                action: action.label().to_string(),
                success: result.is_ok(),
            };
            send_status(self.channel, status, self.metadata).await;
        }
    }
}

/// The main agent that coordinates all components.
pub struct Agent {
    config: AgentConfig,
    router: Router,
    channel: Arc<dyn Channel>,
    session: Session,
}

impl Agent {
    pub fn new(config: AgentConfig, router: Router, channel: Arc<dyn Channel>) -> Self {
        let session = Session::new(config.theme);
        Self {
            config,
            router,
            channel,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run the agent main loop until the channel closes, `/quit`, or Ctrl+C.
    pub async fn run(mut self) -> Result<(), Error> {
        let mut message_stream = self.channel.start().await?;

        tracing::info!("Agent {} ready and listening", self.config.name);

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            match self.handle_message(&message).await {
                Ok(Some(response)) if !response.is_empty() => {
                    self.reply(&message, OutgoingResponse::text(response)).await;
                }
                Ok(Some(_)) => {
                    // Nothing to send
                }
                Ok(None) => {
                    tracing::info!("Shutdown command received, exiting...");
                    break;
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                    self.reply(&message, OutgoingResponse::error(format!("Error: {}", e)))
                        .await;
                }
            }
        }

        tracing::info!(
            turns = self.session.conversation().len(),
            "Agent shutting down..."
        );
        self.channel.shutdown().await?;

        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, response: OutgoingResponse) {
        if let Err(e) = self.channel.respond(message, response).await {
            tracing::warn!("Failed to send response: {}", e);
        }
    }

    async fn status(&self, message: &IncomingMessage, status: StatusUpdate) {
        send_status(self.channel.as_ref(), status, &message.metadata).await;
    }

    // ── Message dispatch ────────────────────────────────────────────

    /// `Ok(None)` asks the loop to stop.
    async fn handle_message(&mut self, message: &IncomingMessage) -> Result<Option<String>, Error> {
        let submission = SubmissionParser::parse(&message.content);

        tracing::debug!(
            "Received message from {} on {} ({} chars)",
            message.user_id,
            message.channel,
            message.content.len()
        );

        match submission {
            Submission::UserInput { content } => self.process_user_input(message, &content).await,
            Submission::Quit => Ok(None),
            Submission::Help => Ok(Some(HELP_TEXT.to_string())),
            Submission::History => Ok(Some(self.render_history())),
            Submission::ToggleTheme => {
                let theme = self.session.toggle_theme();
                self.status(message, StatusUpdate::ThemeChanged(theme)).await;
                Ok(Some(String::new()))
            }
        }
    }

    async fn process_user_input(
        &mut self,
        message: &IncomingMessage,
        content: &str,
    ) -> Result<Option<String>, Error> {
        let progress = ChannelProgress {
            channel: self.channel.as_ref(),
            metadata: &message.metadata,
        };
        let outcome = self
            .session
            .submit_observed(&self.router, content, &progress)
            .await?;
        Ok(Some(outcome.map(|o| o.response).unwrap_or_default()))
    }

    fn render_history(&self) -> String {
        let conversation = self.session.conversation();
        if conversation.is_empty() {
            return "No conversation yet.".to_string();
        }
        conversation
            .iter()
            .map(|turn| {
                let who = match turn.role() {
                    Role::User => "You",
                    Role::Assistant => "AI",
                };
                format!(
                    "[{}] {}: {}",
                    turn.created_at().format("%H:%M:%S"),
                    who,
                    turn.content()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_preview() {
        assert_eq!(truncate_for_preview("short", 10), "short");
        assert_eq!(truncate_for_preview("a\nb   c", 10), "a b c");
        assert_eq!(truncate_for_preview("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_for_preview("héllo wörld", 5), "héllo...");
    }
}
