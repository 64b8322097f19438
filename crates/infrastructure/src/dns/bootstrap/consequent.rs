use std::net::IpAddr;
use std::sync::Arc;

use argent_dns_application::BootstrapResolver;
use argent_dns_domain::DomainError;
use async_trait::async_trait;
use tracing::{debug, warn};

/// A resolver composed of an ordered list of resolvers, tried in sequence
/// until one succeeds. Resolving against an empty chain is a usage error,
/// not something to retry.
#[derive(Debug, Default)]
pub struct ConsequentResolver {
    resolvers: Vec<Arc<dyn BootstrapResolver>>,
}

impl ConsequentResolver {
    pub fn new(resolvers: Vec<Arc<dyn BootstrapResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[async_trait]
impl BootstrapResolver for ConsequentResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        if self.resolvers.is_empty() {
            return Err(DomainError::EmptyBootstrapChain);
        }

        let mut last = None;
        for (index, resolver) in self.resolvers.iter().enumerate() {
            match resolver.resolve(hostname).await {
                Ok(addrs) => {
                    debug!(hostname, position = index, "Bootstrap resolver answered");
                    return Ok(addrs);
                }
                Err(e) => {
                    warn!(hostname, position = index, error = %e, "Bootstrap resolver failed, falling through");
                    last = Some(e);
                }
            }
        }

        Err(last.expect("chain checked non-empty"))
    }
}
