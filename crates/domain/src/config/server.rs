use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Addresses the DNS server listens on for plain-DNS requests.
    #[serde(default = "default_listen_addresses")]
    pub listen_addresses: Vec<SocketAddr>,

    #[serde(default)]
    pub bind_retry: BindRetryConfig,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addresses.is_empty() {
            return Err(ConfigError::Validation(
                "no listen addresses configured".to_string(),
            ));
        }

        self.bind_retry.validate()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addresses: default_listen_addresses(),
            bind_retry: BindRetryConfig::default(),
        }
    }
}

/// Retrying to bind listen addresses, for hosts where the network stack is
/// not yet up when the service starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindRetryConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Wait between attempts. Constant, no backoff.
    #[serde(default = "default_bind_retry_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of attempts excluding the first one.
    #[serde(default = "default_bind_retry_count")]
    pub count: u32,
}

impl BindRetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "bind_retry.interval_ms must be positive when retry is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for BindRetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_bind_retry_interval_ms(),
            count: default_bind_retry_count(),
        }
    }
}

fn default_listen_addresses() -> Vec<SocketAddr> {
    vec!["127.0.0.1:53".parse().unwrap()]
}

fn default_bind_retry_interval_ms() -> u64 {
    1000
}

fn default_bind_retry_count() -> u32 {
    4
}
