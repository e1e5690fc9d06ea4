use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BusError;

pub const ENV_BASE_URL: &str = "DELTABUS_BASE_URL";
pub const ENV_EVENT_CAPACITY: &str = "DELTABUS_EVENT_CAPACITY";
pub const ENV_DELTA_CAPACITY: &str = "DELTABUS_DELTA_CAPACITY";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "DELTABUS_CONNECT_TIMEOUT_MS";

pub const DEFAULT_EVENT_CAPACITY: usize = 1000;
pub const DEFAULT_DELTA_CAPACITY: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Address of the node's web listener. `/events` and `/api/delta` are
    /// resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default = "default_delta_capacity")]
    pub delta_capacity: usize,
    /// Applies to the TCP/TLS handshake only. The event stream itself is
    /// long-lived and has no overall timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            event_capacity: default_event_capacity(),
            delta_capacity: default_delta_capacity(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl BusConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `DELTABUS_*` environment variables. Not
    /// validated, so callers can layer their own overrides on top first.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_BASE_URL) {
            if !value.trim().is_empty() {
                self.base_url = value.trim().to_string();
            }
        }
        if let Some(value) = parse_capacity(&lookup, ENV_EVENT_CAPACITY) {
            self.event_capacity = value;
        }
        if let Some(value) = parse_capacity(&lookup, ENV_DELTA_CAPACITY) {
            self.delta_capacity = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_CONNECT_TIMEOUT_MS) {
            self.connect_timeout_ms = value;
        }
    }

    pub fn validate(&self) -> Result<(), BusError> {
        if self.base_url.trim().is_empty() {
            return Err(BusError::Config("base url cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BusError::Config(format!(
                "base url must be http(s), got '{}'",
                self.base_url
            )));
        }
        if self.event_capacity == 0 {
            return Err(BusError::Config(
                "event capacity must be greater than 0".to_string(),
            ));
        }
        if self.delta_capacity == 0 {
            return Err(BusError::Config(
                "delta capacity must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(BusError::Config(
                "connect timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Joins `path` onto the base url, tolerating a trailing slash on the base.
    pub fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base_url, path)
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, BusError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .build()
            .map_err(|error| BusError::Config(format!("failed to create HTTP client: {error}")))
    }
}

pub(crate) fn join_endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!("ignoring {key}={raw:?}: {error}");
            None
        }
    }
}

fn parse_capacity(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let value = parse_override(lookup, key)?;
    match usize::try_from(value) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!("ignoring {key}={value}: {error}");
            None
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9091".to_string()
}

const fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

const fn default_delta_capacity() -> usize {
    DEFAULT_DELTA_CAPACITY
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}
