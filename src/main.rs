use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use ai_agent::agent::{Agent, Router};
use ai_agent::channels::CliChannel;
use ai_agent::config::AgentConfig;
use ai_agent::error::{ConfigError, Error};
use ai_agent::llm::{LlmConfig, create_provider};
use ai_agent::tools::ToolRegistry;

/// Stderr logging, plus a daily rolling file under `AI_AGENT_LOG_DIR` when set.
/// The returned guard flushes the file writer and must outlive the agent.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match std::env::var("AI_AGENT_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "ai-agent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config() -> Result<(AgentConfig, LlmConfig), Error> {
    Ok((AgentConfig::from_env()?, LlmConfig::from_env()?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let (config, llm_config) = match load_config() {
        Ok(c) => c,
        Err(Error::Config(ConfigError::MissingEnvVar(var))) => {
            eprintln!("Error: {} not set", var);
            eprintln!("  export {}=...", var);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    eprintln!("🤖 AI Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {:?}", llm_config.backend);
    eprintln!("   Model: {}", llm_config.model);
    if config.llm_triage {
        eprintln!("   LLM triage: on");
    }
    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    let llm = create_provider(&llm_config)?;

    let tools = Arc::new(
        ToolRegistry::with_builtins(Arc::clone(&llm), &config)
            .context("failed to build HTTP client for scraping")?,
    );
    tracing::debug!(tools = ?tools.list().await, "Registered tools");

    let router = Router::new(llm, tools, &config);
    let channel = Arc::new(CliChannel::new(config.theme));

    Agent::new(config, router, channel).run().await?;

    Ok(())
}
