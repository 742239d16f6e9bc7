//! Worker configuration
//!
//! Loaded from the environment (after `.env` is read by `dotenvy`).

use std::time::Duration;

use anyhow::Context;

use crate::executor::DEFAULT_TIMEOUT;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis connection URL (default: redis://localhost:6379)
    pub redis_url: String,
    /// Batch timeout used when a job carries none (default: 5000ms)
    pub default_timeout: Duration,
    /// Time allowed for the interpreter version check (default: 10000ms)
    pub version_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            version_timeout: Duration::from_secs(10),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("REDIS_URL") {
            config.redis_url = url;
        }
        if let Some(ms) = lookup("DEFAULT_TIMEOUT_MS") {
            config.default_timeout = parse_millis("DEFAULT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("RUNTIME_VERSION_TIMEOUT_MS") {
            config.version_timeout = parse_millis("RUNTIME_VERSION_TIMEOUT_MS", &ms)?;
        }

        Ok(config)
    }
}

fn parse_millis(key: &str, value: &str) -> anyhow::Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number of milliseconds, got {:?}", key, value))?;
    if ms == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_millis(ms))
}
