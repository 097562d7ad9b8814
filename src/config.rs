//! Minimal runtime configuration helpers.
//! Defaults match the vendor's EMEA host and the cadence the web app polls at.

use std::time::Duration;

use crate::client::{Credentials, DEFAULT_HOST, DEFAULT_REQUEST_TIMEOUT, Endpoints};

pub const DEFAULT_TEMPERATURE_REFRESH_SECS: u64 = 2;
pub const DEFAULT_SCHEDULE_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Vendor host; token and API paths are appended to it.
    pub host: String,
    pub temperature_interval: Duration,
    pub schedule_interval: Duration,
    /// Per-request timeout for the HTTP agent.
    pub request_timeout: Duration,
    /// Stop the poller after this many ticks. Unset polls forever.
    pub max_poll_cycles: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| match lookup(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(format!("Missing credentials: set {}", key)),
        };
        let username = required("EVOHOME_USERNAME")?.trim().to_string();
        let password = required("EVOHOME_PASSWORD")?;

        let host = lookup("EVOHOME_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(format!("EVOHOME_HOST must start with http:// or https:// (got {})", host));
        }

        let temperature_secs = positive_secs(&lookup, "TEMPERATURE_REFRESH_SECS", DEFAULT_TEMPERATURE_REFRESH_SECS)?;
        let schedule_secs = positive_secs(&lookup, "SCHEDULE_REFRESH_SECS", DEFAULT_SCHEDULE_REFRESH_SECS)?;
        let timeout_secs = positive_secs(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT.as_secs())?;

        let max_poll_cycles = match lookup("MAX_POLL_CYCLES") {
            Some(s) if !s.trim().is_empty() => Some(
                s.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| "MAX_POLL_CYCLES must be a positive integer".to_string())?,
            ),
            _ => None,
        };

        Ok(Config {
            credentials: Credentials::new(username, password),
            host,
            temperature_interval: Duration::from_secs(temperature_secs),
            schedule_interval: Duration::from_secs(schedule_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            max_poll_cycles,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::for_host(&self.host)
    }
}

fn positive_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(s) if !s.trim().is_empty() => match s.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(format!("{} must be a positive number of seconds", key)),
        },
        _ => Ok(default),
    }
}
