use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Main configuration structure for Argent DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Server configuration (listen addresses, bind retry)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream routing and bootstrap configuration
    #[serde(default)]
    pub dns: DnsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. argent-dns.toml in current directory
    /// 3. /etc/argent-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("argent-dns.toml").exists() {
            Self::from_file("argent-dns.toml")?
        } else if std::path::Path::new("/etc/argent-dns/config.toml").exists() {
            Self::from_file("/etc/argent-dns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(listen) = overrides.listen_address {
            self.server.listen_addresses = vec![listen];
        }
        if let Some(upstream) = overrides.upstream {
            self.dns.groups.clear();
            self.dns.upstream_servers = vec![upstream];
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.dns.validate()
    }
}

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listen_address: Option<SocketAddr>,

    /// Replaces every configured group with a single default one.
    pub upstream: Option<String>,

    pub log_level: Option<String>,
}
