//! Configuration management for zendesk-auth

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Zendesk API configuration
    pub zendesk: ZendeskConfig,
    /// Session storage configuration
    pub session: SessionConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct ZendeskConfig {
    /// Zendesk tenant, as in `{subdomain}.zendesk.com`
    pub subdomain: String,
    /// Replaces `https://{subdomain}.zendesk.com` (proxies, local mocks).
    /// Only scheme, host and port are taken from it.
    pub api_base_url: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. 0 means a single attempt.
    pub network_retries: u32,
    pub retry_backoff_ms: u64,
}

impl ZendeskConfig {
    pub fn new(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            api_base_url: None,
            timeout_secs: 10,
            network_retries: 0,
            retry_backoff_ms: 200,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// When unset, sessions live in process memory
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: "zendesk_auth:session".to_string(),
            ttl_secs: 7200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "pretty" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            zendesk: ZendeskConfig {
                subdomain: env::var("ZENDESK_SUBDOMAIN")
                    .context("ZENDESK_SUBDOMAIN is required")?,
                api_base_url: env::var("ZENDESK_API_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                timeout_secs: parse_var("ZENDESK_TIMEOUT_SECS", 10)?,
                network_retries: parse_var("ZENDESK_NETWORK_RETRIES", 0)?,
                retry_backoff_ms: parse_var("ZENDESK_RETRY_BACKOFF_MS", 200)?,
            },
            session: SessionConfig {
                redis_url: env::var("REDIS_URL").ok(),
                key_prefix: env::var("SESSION_KEY_PREFIX")
                    .unwrap_or_else(|_| "zendesk_auth:session".to_string()),
                ttl_secs: parse_var("SESSION_TTL_SECS", 7200)?,
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
            },
        };

        if config.zendesk.timeout_secs == 0 {
            anyhow::bail!("ZENDESK_TIMEOUT_SECS must be greater than zero");
        }
        if config.session.ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be greater than zero");
        }

        Ok(config)
    }
}

/// Numeric env var with a default when unset. A set but unparseable value is
/// an error, never silently replaced.
fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
