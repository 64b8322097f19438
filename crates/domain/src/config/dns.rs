use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::upstream_group::{GroupName, MatchCriteria, UpstreamGroup};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Flat upstream list. Promoted to a `default` group when no groups are
    /// configured.
    #[serde(default)]
    pub upstream_servers: Vec<String>,

    /// Timeout for outgoing DNS requests.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl DnsConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Normalizes the raw group configuration into typed groups: reserved
    /// names become their enum variants and client prefixes are parsed. A
    /// flat `upstream_servers` list becomes one `default` group per server.
    pub fn upstream_groups(&self) -> Result<Vec<UpstreamGroup>, ConfigError> {
        if self.groups.is_empty() {
            return Ok(self
                .upstream_servers
                .iter()
                .map(|server| UpstreamGroup {
                    name: GroupName::Default,
                    address: server.as_str().into(),
                    match_criteria: Vec::new(),
                })
                .collect());
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut criteria = Vec::with_capacity(group.matches.len());
            for (index, rule) in group.matches.iter().enumerate() {
                let client = match &rule.client {
                    Some(prefix) => {
                        Some(prefix.parse::<IpNetwork>().map_err(|e| {
                            ConfigError::Validation(format!(
                                "group \"{}\": match at index {}: invalid client prefix '{}': {}",
                                group.name, index, prefix, e
                            ))
                        })?)
                    }
                    None => None,
                };

                criteria.push(MatchCriteria {
                    client,
                    question_domain: rule.question_domain.as_deref().map(Arc::from),
                });
            }

            groups.push(UpstreamGroup {
                name: GroupName::parse(&group.name),
                address: group.address.as_str().into(),
                match_criteria: criteria,
            });
        }

        Ok(groups)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "upstream_timeout_ms must be positive".to_string(),
            ));
        }

        let groups = self.upstream_groups()?;
        if !groups.iter().any(|g| g.name == GroupName::Default) {
            return Err(ConfigError::Validation(
                "no \"default\" upstream group configured".to_string(),
            ));
        }

        for group in &groups {
            group
                .validate()
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }

        self.bootstrap.validate()
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: Vec::new(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            groups: vec![GroupConfig {
                name: "default".to_string(),
                address: "https://unfiltered.adguard-dns.com/dns-query".to_string(),
                matches: Vec::new(),
            }],
            bootstrap: BootstrapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupConfig {
    pub name: String,

    pub address: String,

    #[serde(rename = "match", default)]
    pub matches: Vec<MatchRule>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MatchRule {
    /// Client subnet in CIDR form.
    #[serde(default)]
    pub client: Option<String>,

    #[serde(default)]
    pub question_domain: Option<String>,
}

/// Servers used only to resolve the hostnames inside upstream addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_bootstrap_servers")]
    pub servers: Vec<SocketAddr>,

    #[serde(default = "default_bootstrap_timeout_ms")]
    pub timeout_ms: u64,
}

impl BootstrapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "bootstrap.timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            servers: default_bootstrap_servers(),
            timeout_ms: default_bootstrap_timeout_ms(),
        }
    }
}

fn default_upstream_timeout_ms() -> u64 {
    2000
}

fn default_bootstrap_timeout_ms() -> u64 {
    2000
}

fn default_bootstrap_servers() -> Vec<SocketAddr> {
    vec![
        "9.9.9.10:53".parse().unwrap(),
        "149.112.112.10:53".parse().unwrap(),
        "[2620:fe::10]:53".parse().unwrap(),
        "[2620:fe::fe:10]:53".parse().unwrap(),
    ]
}
