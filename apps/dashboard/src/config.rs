use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Optional absolute health URLs tried in order.
    pub health_urls: Vec<String>,
    pub port: u16,
    pub rust_log: String,
    pub http_timeout: Duration,
    pub query_retries: u32,
    pub query_retry_base: Duration,
    pub query_gc: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse = |key: &str, default: u64| parse_or(&lookup, key, default);

        Ok(Config {
            api_base_url: lookup("API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            health_urls: lookup("HEALTH_URLS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            port: parse_or(&lookup, "PORT", 3000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            http_timeout: Duration::from_secs(parse("HTTP_TIMEOUT_SECS", 30)?),
            query_retries: parse_or(&lookup, "QUERY_RETRIES", 3)?,
            query_retry_base: Duration::from_millis(parse("QUERY_RETRY_BASE_MS", 1000)?),
            query_gc: Duration::from_secs(parse("QUERY_GC_SECS", 300)?),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
