use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completion client.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: "test-model".to_string(),
            api_key: "test-key".to_string(),
        }
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": messages,
            "temperature": 0.3,
            "max_tokens": 2048,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;
        let text = resp.text().await.context("Failed to read LLM response")?;
        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse LLM JSON")?;

        // Extract content from choices[0].message.content (handle null)
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_v1_base() {
        let llm = LlmClient::with_base_url("https://api.example.com/api/v1");
        assert_eq!(
            llm.endpoint(),
            "https://api.example.com/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_already_full() {
        let llm = LlmClient::with_base_url("http://localhost:1234/v1/chat/completions/");
        assert_eq!(llm.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_bare_host() {
        let llm = LlmClient::with_base_url("http://localhost:1234");
        assert_eq!(llm.endpoint(), "http://localhost:1234/v1/chat/completions");
    }
}
