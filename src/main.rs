mod agent;
mod chat;
mod config;
mod knowledge;
mod llm;
mod server;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agent::{prompts, AgentEngine};
use config::Config;
use knowledge::KnowledgeBase;
use llm::LlmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let config = Config::from_env()?;

    // Eager initial load — refuse to start without a dataset snapshot.
    let knowledge = Arc::new(
        KnowledgeBase::init(config.data_paths.clone(), prompts::build_instructions)
            .context("cannot start without an initial dataset snapshot")?,
    );

    let llm = Arc::new(LlmClient::new(&config)?);
    info!("LLM client initialized");

    let engine = Arc::new(AgentEngine::new(llm, Arc::clone(&knowledge), config.max_age));

    let daemon = tokio::spawn({
        let kb = Arc::clone(&knowledge);
        let interval = config.refresh_interval;
        async move { kb.run_periodic(interval).await }
    });

    // `sniffle serve` runs the HTTP API; anything else is the chat loop.
    let serve_mode = std::env::args().nth(1).as_deref() == Some("serve");
    let result = if serve_mode {
        server::serve(Arc::clone(&engine), config.port).await
    } else {
        chat::run(engine).await
    };

    // Cancellation is the expected way the daemon ends at shutdown.
    daemon.abort();
    match daemon.await {
        Err(e) if e.is_cancelled() => {}
        Err(e) => warn!(error = %e, "refresh daemon ended abnormally"),
        Ok(()) => {}
    }

    result
}
