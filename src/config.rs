//! Configuration Management
//!
//! Handles persistent configuration storage for tcprov and resolves the
//! effective region, credentials and retry settings.

use crate::provider::{Provider, TASK_POLL_INTERVAL, TASK_TIMEOUT};
use crate::retry::{Backoff, RetryPolicy, READ_RETRY_TIMEOUT, WRITE_RETRY_TIMEOUT};
use crate::tencentcloud::auth::Credential;
use crate::tencentcloud::client::{TencentCloudClient, DEFAULT_REGION};
use crate::tencentcloud::ratelimit::{RateLimiter, DEFAULT_RATE_PER_SECOND};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Delay between retry attempts as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    #[default]
    None,
    Fixed {
        interval_ms: u64,
    },
    Exponential {
        initial_ms: u64,
        max_ms: u64,
    },
}

impl From<BackoffConfig> for Backoff {
    fn from(config: BackoffConfig) -> Self {
        match config {
            BackoffConfig::None => Backoff::None,
            BackoffConfig::Fixed { interval_ms } => Backoff::Fixed(Duration::from_millis(interval_ms)),
            BackoffConfig::Exponential { initial_ms, max_ms } => Backoff::Exponential {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default region
    #[serde(default)]
    pub region: Option<String>,
    /// Base URL replacing `https://{service}.tencentcloudapi.com`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub security_token: Option<String>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    #[serde(default)]
    pub write_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry_backoff: BackoffConfig,
    /// Calls per second per action, 0 disables limiting
    #[serde(default)]
    pub rate_limit_per_second: Option<u32>,
    #[serde(default)]
    pub task_poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tcprov").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective region (CLI > environment > config > default)
    pub fn effective_region(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| env_var("TENCENTCLOUD_REGION"))
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective endpoint override (CLI > config)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.endpoint.clone())
    }

    /// Get effective credentials (environment > config)
    pub fn effective_credential(&self) -> Result<Credential> {
        if let Some(credential) = Credential::from_env() {
            return Ok(credential);
        }

        let secret_id = self
            .secret_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("No credentials: set TENCENTCLOUD_SECRET_ID/TENCENTCLOUD_SECRET_KEY or secret_id in the config file")?;
        let secret_key = self
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("secret_key is missing from the config file")?;
        Ok(Credential::new(secret_id, secret_key).with_token(self.security_token.clone()))
    }

    pub fn read_policy(&self) -> RetryPolicy {
        let timeout = self
            .read_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(READ_RETRY_TIMEOUT);
        RetryPolicy::new(timeout).with_backoff(self.retry_backoff.into())
    }

    pub fn write_policy(&self) -> RetryPolicy {
        let timeout = self
            .write_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(WRITE_RETRY_TIMEOUT);
        RetryPolicy::new(timeout).with_backoff(self.retry_backoff.into())
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        match self.rate_limit_per_second.unwrap_or(DEFAULT_RATE_PER_SECOND) {
            0 => RateLimiter::disabled(),
            n => RateLimiter::new(n),
        }
    }

    /// Build the provider for the effective region and endpoint
    pub fn build_provider(&self, region: Option<&str>, endpoint: Option<&str>) -> Result<Provider> {
        let region = self.effective_region(region);
        let client = TencentCloudClient::new(self.effective_credential()?, &region)
            .context("Failed to build TencentCloud client")?
            .with_endpoint(self.effective_endpoint(endpoint))
            .with_rate_limiter(self.rate_limiter());

        tracing::info!("Using region {}", region);

        let poll = self
            .task_poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(TASK_POLL_INTERVAL);
        let task_timeout = self
            .task_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(TASK_TIMEOUT);

        Ok(Provider::new(client)
            .with_policies(self.read_policy(), self.write_policy())
            .with_task_polling(poll, task_timeout))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
