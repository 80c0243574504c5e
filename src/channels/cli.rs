//! CLI channel: stdin/stdout REPL.
//!
//! Replies go to stdout so the transcript can be piped; prompts and status
//! lines go to stderr.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::agent::session::Theme;
use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

const RESET: &str = "\x1b[0m";

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    theme: Mutex<Theme>,
}

impl CliChannel {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme: Mutex::new(theme),
        }
    }

    fn theme(&self) -> Theme {
        self.theme.lock().map(|t| *t).unwrap_or_default()
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// Wrap a reply in the ANSI colours of `theme`.
pub fn render(theme: Theme, response: &OutgoingResponse) -> String {
    let color = match (theme, response.is_error) {
        (Theme::Light, false) => "\x1b[30;47m",
        (Theme::Dark, false) => "\x1b[97;40m",
        (Theme::Light, true) => "\x1b[31;47m",
        (Theme::Dark, true) => "\x1b[91;40m",
    };
    response
        .content
        .lines()
        .map(|line| format!("{color}{line}{RESET}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_reply(out: &mut impl Write, text: &str) -> Result<(), ChannelError> {
    writeln!(out, "\n{text}\n")
        .and_then(|()| out.flush())
        .map_err(|e| ChannelError::SendFailed {
            name: "cli".to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", "local-user", &line);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        write_reply(&mut std::io::stdout(), &render(self.theme(), &response))?;
        eprint!("> ");
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        match status {
            StatusUpdate::Thinking(msg) => eprintln!("⏳ {}", msg),
            StatusUpdate::ActionStarted { action } => eprintln!("🔧 Running {}...", action),
            StatusUpdate::ActionCompleted { action, success } => {
                if success {
                    eprintln!("✅ {} done", action);
                } else {
                    eprintln!("❌ {} failed", action);
                }
            }
            StatusUpdate::ThemeChanged(theme) => {
                if let Ok(mut current) = self.theme.lock() {
                    *current = theme;
                }
                eprintln!("🎨 Theme: {}", theme);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_styles_each_line() {
        let out = render(Theme::Dark, &OutgoingResponse::text("a\nb"));
        assert_eq!(out, "\x1b[97;40ma\x1b[0m\n\x1b[97;40mb\x1b[0m");
    }

    #[test]
    fn errors_render_differently() {
        let ok = render(Theme::Light, &OutgoingResponse::text("x"));
        let err = render(Theme::Light, &OutgoingResponse::error("x"));
        assert_ne!(ok, err);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_reply_surrounds_text_with_blank_lines() {
        let mut out = Vec::new();
        write_reply(&mut out, "hello").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nhello\n\n");
    }

    #[test]
    fn write_failure_is_a_send_error() {
        let err = write_reply(&mut ClosedPipe, "hello").unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed { ref name, .. } if name == "cli"));
    }

    #[tokio::test]
    async fn theme_change_status_updates_rendering() {
        let channel = CliChannel::new(Theme::Light);
        channel
            .send_status(StatusUpdate::ThemeChanged(Theme::Dark), &serde_json::Value::Null)
            .await
            .unwrap();
        assert_eq!(channel.theme(), Theme::Dark);
    }
}
