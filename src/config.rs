//! Runner configuration
//!
//! The host passes everything through environment variables. Only the port
//! is required; the rest fall back to defaults that suit a local run.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};
use crate::retry::RetryConfig;

/// Port the host listens on for this runner (required)
pub const PORT_ENV: &str = "GAUGE_INTERNAL_PORT";
/// Host to connect to
pub const HOST_ENV: &str = "GAUGE_RUNNER_HOST";
/// Fallback log filter when `RUST_LOG` is unset
pub const LOG_LEVEL_ENV: &str = "GAUGE_RUNNER_LOG_LEVEL";
pub const MAX_ATTEMPTS_ENV: &str = "GAUGE_CONNECT_MAX_ATTEMPTS";
pub const BASE_DELAY_ENV: &str = "GAUGE_CONNECT_BASE_DELAY_MS";
pub const MAX_DELAY_ENV: &str = "GAUGE_CONNECT_MAX_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_host() -> String {
    "localhost".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl RunnerConfig {
    /// Config for `port` with every other field defaulted
    pub fn new(port: u16) -> Self {
        Self {
            port,
            host: default_host(),
            log_level: default_log_level(),
            retry: RetryConfig::default(),
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset. A value that is set but does not parse
    /// is an error rather than a silent default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = get(PORT_ENV)
            .ok_or_else(|| RunnerError::Config(format!("{PORT_ENV} is not set")))?;
        let mut config = Self::new(parse(PORT_ENV, &port)?);

        if let Some(host) = get(HOST_ENV) {
            config.host = host;
        }
        if let Some(level) = get(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        if let Some(value) = get(MAX_ATTEMPTS_ENV) {
            config.retry.max_attempts = parse(MAX_ATTEMPTS_ENV, &value)?;
        }
        if let Some(value) = get(BASE_DELAY_ENV) {
            config.retry.base_delay_ms = parse(BASE_DELAY_ENV, &value)?;
        }
        if let Some(value) = get(MAX_DELAY_ENV) {
            config.retry.max_delay_ms = parse(MAX_DELAY_ENV, &value)?;
        }

        Ok(config)
    }

    /// `host:port` to connect to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RunnerError::Config(format!("{key}={value:?} is invalid: {e}")))
}
