use std::net::IpAddr;
use std::sync::Arc;

use argent_dns_application::BootstrapResolver;
use argent_dns_domain::DomainError;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Caches successful resolutions of the wrapped resolver for the lifetime of
/// the service. Failures are never cached; the next resolution asks the
/// inner resolver again.
#[derive(Debug)]
pub struct CachingResolver {
    inner: Arc<dyn BootstrapResolver>,
    cache: DashMap<String, Vec<IpAddr>>,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn BootstrapResolver>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl BootstrapResolver for CachingResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        if let Some(hit) = self.cache.get(hostname) {
            debug!(hostname, "Bootstrap cache hit");
            return Ok(hit.value().clone());
        }

        let addrs = self.inner.resolve(hostname).await?;
        self.cache.insert(hostname.to_string(), addrs.clone());

        Ok(addrs)
    }
}
