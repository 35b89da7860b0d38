//! Provider configuration.
//!
//! Values are resolved in order: explicit overrides (CLI flags), then
//! `MERAKI_DASHBOARD_*` environment variables, then defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, RetryConfig};
use crate::runtime::Runtime;

pub const API_KEY_ENV: &str = "MERAKI_DASHBOARD_API_KEY";
pub const BASE_URL_ENV: &str = "MERAKI_DASHBOARD_API_URL";
pub const USER_AGENT_ENV: &str = "MERAKI_DASHBOARD_API_USER_AGENT";
pub const MAX_RETRIES_ENV: &str = "MERAKI_DASHBOARD_API_MAX_RETRIES";
pub const RETRY_DELAY_ENV: &str = "MERAKI_DASHBOARD_API_RETRY_DELAY_MS";
pub const TIMEOUT_ENV: &str = "MERAKI_DASHBOARD_API_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn default_user_agent() -> String {
    format!("meraki-provider/{}", env!("MERAKI_PROVIDER_VERSION"))
}

/// Settings that take precedence over the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    #[tracing::instrument(skip(runtime, overrides))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let api_key = overrides
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env_value(runtime, API_KEY_ENV))
            .ok_or_else(|| {
                anyhow!(
                    "Missing Dashboard API key. Set the {} environment variable.",
                    API_KEY_ENV
                )
            })?;

        let base_url = overrides
            .base_url
            .or_else(|| env_value(runtime, BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let user_agent = overrides
            .user_agent
            .or_else(|| env_value(runtime, USER_AGENT_ENV))
            .unwrap_or_else(default_user_agent);

        let max_retries = match overrides.max_retries {
            Some(n) => n,
            None => env_number(runtime, MAX_RETRIES_ENV)?.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        let retry_delay_ms = match overrides.retry_delay_ms {
            Some(ms) => ms,
            None => env_number(runtime, RETRY_DELAY_ENV)?.unwrap_or(DEFAULT_RETRY_DELAY_MS),
        };

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => env_number(runtime, TIMEOUT_ENV)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            bail!("Request timeout must be at least one second");
        }

        let config = Self {
            api_key,
            base_url,
            user_agent,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
            timeout: Duration::from_secs(timeout_secs),
        };
        debug!("Loaded provider configuration: {:?}", config);

        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.retry_delay)
    }
}

fn env_value<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<R, T>(runtime: &R, key: &str) -> Result<Option<T>>
where
    R: Runtime + ?Sized,
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_value(runtime, key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid value {:?} for {}: {}", raw, key, e)),
        None => Ok(None),
    }
}

fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        bail!(
            "Dashboard API URL must start with http:// or https://, got {:?}",
            url
        );
    }
    Ok(url.to_string())
}
