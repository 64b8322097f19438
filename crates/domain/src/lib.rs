//! Argent DNS Domain Layer
pub mod config;
pub mod dns_name;
pub mod endpoint;
pub mod errors;
pub mod upstream_group;

pub use config::{BindRetryConfig, BootstrapConfig, CliOverrides, Config, ConfigError, DnsConfig};
pub use endpoint::{DnsEndpoint, Scheme, UpstreamAddr};
pub use errors::DomainError;
pub use upstream_group::{GroupName, MatchCriteria, UpstreamGroup};
