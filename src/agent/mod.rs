pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::knowledge::KnowledgeBase;
use crate::llm::{LlmClient, Message};

/// Runs user queries against the completion provider using the instructions
/// derived from the current dataset snapshot.
pub struct AgentEngine {
    llm: Arc<LlmClient>,
    knowledge: Arc<KnowledgeBase>,
    max_age: Duration,
}

impl AgentEngine {
    pub fn new(llm: Arc<LlmClient>, knowledge: Arc<KnowledgeBase>, max_age: Duration) -> Self {
        Self {
            llm,
            knowledge,
            max_age,
        }
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// Answer one user query. Refreshes the knowledge base first if it has
    /// gone stale, so the agent never answers from data older than `max_age`
    /// without at least re-checking the source.
    pub async fn respond(&self, query: &str) -> Result<String> {
        self.knowledge.refresh_if_stale(self.max_age).await;

        let messages = [
            Message::system(self.knowledge.instructions().await),
            Message::user(query),
        ];
        let reply = self.llm.chat(&messages).await?;
        Ok(strip_reasoning(&reply).to_string())
    }
}

/// Drop a leading reasoning block: everything up to and including the first
/// `</think>` tag. Reasoning models emit these even when asked not to.
fn strip_reasoning(response: &str) -> &str {
    match response.split_once("</think>") {
        Some((_, answer)) => answer.trim_start(),
        None => response,
    }
}
