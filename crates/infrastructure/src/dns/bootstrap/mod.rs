//! Bootstrap resolution: the resolvers used to resolve the hostname portion
//! of upstream addresses before those upstreams can be reached.

pub mod caching;
pub mod consequent;
pub mod udp_resolver;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use argent_dns_application::{BootstrapResolver, ResolverCloser};
use argent_dns_domain::DomainError;

pub use caching::CachingResolver;
pub use consequent::ConsequentResolver;
pub use udp_resolver::UdpResolver;

/// The constructed bootstrap chain plus the resources to release together at
/// service shutdown, in input order.
pub struct BootstrapChain {
    pub resolver: Arc<ConsequentResolver>,
    pub closers: Vec<Arc<dyn ResolverCloser>>,
}

/// Builds one resolver per bootstrap server, each wrapped in a caching
/// decorator, composed into a consequent resolver tried in input order.
/// A construction failure at any index is recorded and that server skipped;
/// the joined failures come back alongside the (possibly empty) chain.
pub fn build_chain(
    servers: &[SocketAddr],
    timeout: Duration,
) -> (BootstrapChain, Result<(), DomainError>) {
    let mut resolvers: Vec<Arc<dyn BootstrapResolver>> = Vec::with_capacity(servers.len());
    let mut closers: Vec<Arc<dyn ResolverCloser>> = Vec::with_capacity(servers.len());
    let mut errors = Vec::new();

    for (index, server) in servers.iter().enumerate() {
        match UdpResolver::new(*server, timeout) {
            Ok(resolver) => {
                let resolver = Arc::new(resolver);
                closers.push(Arc::clone(&resolver) as Arc<dyn ResolverCloser>);
                resolvers.push(Arc::new(CachingResolver::new(resolver)));
            }
            Err(e) => {
                errors.push(DomainError::BootstrapBuild {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    let chain = BootstrapChain {
        resolver: Arc::new(ConsequentResolver::new(resolvers)),
        closers,
    };

    (chain, DomainError::join(errors))
}
