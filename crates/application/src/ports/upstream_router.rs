use std::fmt::Debug;
use std::net::IpAddr;
use std::sync::Arc;

use argent_dns_domain::DomainError;
use async_trait::async_trait;

/// An established upstream connection handle. Created once per unique
/// address, shared by every routing entry that references that address.
#[async_trait]
pub trait UpstreamHandle: Send + Sync + Debug {
    /// The address exactly as configured, the handle's identity.
    fn address(&self) -> &str;

    /// Sends a raw DNS query and returns the raw response.
    async fn exchange(&self, query: &[u8]) -> Result<Vec<u8>, DomainError>;
}

/// Query-time view of the routing table: an ordered list of upstreams to try
/// for a given client address and question domain.
pub trait UpstreamRouter: Send + Sync {
    fn route(&self, client: IpAddr, question: &str) -> Vec<Arc<dyn UpstreamHandle>>;

    /// Upstreams for private-network resolution, empty when none are
    /// configured.
    fn route_private(&self) -> Vec<Arc<dyn UpstreamHandle>>;
}
