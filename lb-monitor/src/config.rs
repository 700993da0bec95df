//! Environment-driven configuration.
//!
//! Supported env vars:
//! - `MONITOR_BIND_ADDRESS` (default "0.0.0.0")
//! - `MONITOR_PORT` (default 8090)
//! - `MONITOR_SAMPLE_INTERVAL_SECS` (default 5)
//! - `MONITOR_CONN_RESET_INTERVAL_SECS` (optional, periodic connection reset)
//! - `MONITOR_LOG_DIR` (optional, daily rolling log file)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::server::ApiServerConfig;
use crate::error::{Error, Result};

/// Default resource sampling interval in seconds.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// HTTP server settings
    pub api: ApiServerConfig,
    /// How often CPU and memory are sampled
    pub sample_interval: Duration,
    /// How often connection counts are reset, if at all
    pub conn_reset_interval: Option<Duration>,
    /// Directory for rolling log files
    pub log_dir: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api: ApiServerConfig::default(),
            sample_interval: Duration::from_secs(DEFAULT_SAMPLE_INTERVAL_SECS),
            conn_reset_interval: None,
            log_dir: None,
        }
    }
}

impl MonitorConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(bind_address) = get("MONITOR_BIND_ADDRESS") {
            config.api.bind_address = bind_address.trim().to_string();
        }

        if let Some(port) = parse(&get, "MONITOR_PORT")? {
            config.api.port = port;
        }

        if let Some(secs) = parse::<u64, _>(&get, "MONITOR_SAMPLE_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(Error::config("MONITOR_SAMPLE_INTERVAL_SECS must be greater than 0"));
            }
            config.sample_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse::<u64, _>(&get, "MONITOR_CONN_RESET_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(Error::config(
                    "MONITOR_CONN_RESET_INTERVAL_SECS must be greater than 0",
                ));
            }
            config.conn_reset_interval = Some(Duration::from_secs(secs));
        }

        config.log_dir = get("MONITOR_LOG_DIR").map(PathBuf::from);

        Ok(config)
    }
}

fn parse<T, F>(get: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::config(format!("Invalid {} '{}': {}", key, raw, e)))
        })
        .transpose()
}
