//! Environment configuration

use std::str::FromStr;
use std::time::Duration;

use progress_core::IntervalTable;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration.
///
/// Env vars:
/// - DATABASE_URL: PostgreSQL connection string (required)
/// - HOST / PORT: bind address (default 0.0.0.0:3000)
/// - INTERVAL_DAYS: comma-separated review intervals per mastery level
/// - RATE_LIMIT_MAX_REQUESTS / RATE_LIMIT_WINDOW_SECS: per-client request budget
/// - TRUST_FORWARDED_FOR: key rate limits on X-Forwarded-For (default false)
/// - REVIEW_LIMIT: most due items pulled into one session, and most content
///   refs a session request may list
/// - SESSION_IDLE_SECS: untouched sessions are dropped after this long
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub intervals: IntervalTable,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub trust_forwarded_for: bool,
    pub review_limit: u32,
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;

        let intervals = match lookup("INTERVAL_DAYS") {
            Some(value) => IntervalTable::from_str(&value).map_err(|_| ConfigError::Invalid {
                key: "INTERVAL_DAYS",
                value,
            })?,
            None => IntervalTable::default(),
        };

        let rate_limit_max_requests = parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 60)?;
        let window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60)?;
        let trust_forwarded_for = parse_or(&lookup, "TRUST_FORWARDED_FOR", false)?;
        let review_limit = parse_or(&lookup, "REVIEW_LIMIT", 50)?;
        let idle_secs: u64 = parse_or(&lookup, "SESSION_IDLE_SECS", 1800)?;

        Ok(Self {
            database_url,
            host,
            port,
            intervals,
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(window_secs),
            trust_forwarded_for,
            review_limit,
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
