use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::tailoring::enhancement::WaitPolicy;

const DEFAULT_ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
const DEFAULT_HN_API_URL: &str = "https://hn.algolia.com/api/v1/search";

/// Application configuration loaded from environment variables.
/// Backing services are optional: without them the service falls back to in-process stores.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub redis_url: Option<String>,
    pub habits_file: Option<PathBuf>,
    pub default_cluster_count: usize,
    pub job_wait: WaitPolicy,
    pub webhook_secret: Option<String>,
    pub arxiv_api_url: String,
    pub hn_api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_cluster_count: usize = parse_env("DEFAULT_CLUSTER_COUNT", 3)?;
        if default_cluster_count == 0 {
            anyhow::bail!("DEFAULT_CLUSTER_COUNT must be at least 1");
        }

        let job_wait = WaitPolicy {
            timeout: Duration::from_millis(parse_env("JOB_WAIT_TIMEOUT_MS", 30_000)?),
            initial_delay: Duration::from_millis(parse_env("JOB_POLL_INITIAL_MS", 250)?),
            max_delay: Duration::from_millis(parse_env("JOB_POLL_MAX_MS", 4_000)?),
            multiplier: 2,
        };

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            redis_url: optional_env("REDIS_URL"),
            habits_file: optional_env("HABITS_FILE").map(PathBuf::from),
            default_cluster_count,
            job_wait,
            webhook_secret: optional_env("WEBHOOK_SECRET"),
            arxiv_api_url: optional_env("ARXIV_API_URL")
                .unwrap_or_else(|| DEFAULT_ARXIV_API_URL.to_string()),
            hn_api_url: optional_env("HN_API_URL").unwrap_or_else(|| DEFAULT_HN_API_URL.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            database_url: None,
            db_max_connections: 10,
            redis_url: None,
            habits_file: None,
            default_cluster_count: 3,
            job_wait: WaitPolicy::default(),
            webhook_secret: None,
            arxiv_api_url: DEFAULT_ARXIV_API_URL.to_string(),
            hn_api_url: DEFAULT_HN_API_URL.to_string(),
        }
    }
}

/// Unset or blank variables are `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("COACH_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("COACH_TEST_BAD_NUMBER", "forty-two");
        let result: Result<u16> = parse_env("COACH_TEST_BAD_NUMBER", 1);
        assert!(result.is_err());
        std::env::remove_var("COACH_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_blank_optional_env_is_none() {
        std::env::set_var("COACH_TEST_BLANK", "  ");
        assert!(optional_env("COACH_TEST_BLANK").is_none());
        std::env::remove_var("COACH_TEST_BLANK");
    }
}
