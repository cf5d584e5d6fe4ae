use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Runtime configuration, loaded from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion-provider credentials. Required — the process refuses to
    /// start without one.
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Candidate dataset locations, tried in order.
    pub data_paths: Vec<PathBuf>,
    /// Background refresh period.
    pub refresh_interval: Duration,
    /// Maximum tolerated snapshot age before a query forces a refresh attempt.
    pub max_age: Duration,
    pub port: u16,
}

const DEFAULT_DATA_PATHS: &str = "./data/ai_analyzer.json,./backend/ai_analyzer.json,./ai_analyzer.json";

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = dotenv::var("IOINTEL_API_KEY")
            .context("IOINTEL_API_KEY not set — check your .env file")?;

        let base_url = dotenv::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.intelligence.io.solutions/api/v1".to_string());
        let model = dotenv::var("LLM_MODEL")
            .unwrap_or_else(|_| "deepseek-ai/DeepSeek-R1-0528".to_string());

        let data_paths = parse_paths(
            &dotenv::var("SNIFFLE_DATA_PATHS").unwrap_or_else(|_| DEFAULT_DATA_PATHS.to_string()),
        );

        let refresh_interval = Duration::from_secs(parse_secs("SNIFFLE_REFRESH_SECS", 600)?);
        let max_age = Duration::from_secs(parse_secs("SNIFFLE_MAX_AGE_SECS", 600)?);

        let port = match dotenv::var("SNIFFLE_PORT") {
            Ok(s) => s.parse::<u16>().context("SNIFFLE_PORT must be a port number")?,
            Err(_) => 8000,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            data_paths,
            refresh_interval,
            max_age,
            port,
        })
    }
}

fn parse_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_secs(key: &str, default: u64) -> Result<u64> {
    match dotenv::var(key) {
        Ok(s) => s
            .parse::<u64>()
            .with_context(|| format!("{} must be a number of seconds", key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths_trims_and_skips_empty() {
        let paths = parse_paths(" ./a.json, ./b/c.json ,,./d.json ");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("./a.json"),
                PathBuf::from("./b/c.json"),
                PathBuf::from("./d.json"),
            ]
        );
    }

    #[test]
    fn test_parse_paths_empty_input() {
        assert!(parse_paths("").is_empty());
    }
}
