use std::fmt::Debug;
use std::net::IpAddr;

use argent_dns_domain::DomainError;
use async_trait::async_trait;

/// A resolver used only to resolve the hostname portion of an upstream's
/// address before a connection to that upstream can be established.
#[async_trait]
pub trait BootstrapResolver: Send + Sync + Debug {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError>;
}

/// A resource acquired during bootstrap construction that must be released
/// at service shutdown.
#[async_trait]
pub trait ResolverCloser: Send + Sync {
    async fn close(&self) -> Result<(), DomainError>;
}
