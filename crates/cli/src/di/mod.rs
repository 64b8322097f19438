use std::sync::Arc;

use argent_dns_application::{BootstrapResolver, SelectUpstreamsUseCase};
use argent_dns_domain::Config;
use argent_dns_infrastructure::dns::{
    build_chain, build_routing_table, DnsRelay, DnsService, DnsServiceConfig, RoutingOptions,
    UpstreamPool,
};
use tracing::{info, warn};

/// Wires the whole service: bootstrap chain, upstream pool, routing table,
/// relay, listeners. Build failures that leave usable routes are logged and
/// tolerated; a table that cannot route anything refuses to start.
pub fn build_dns_service(config: &Config) -> anyhow::Result<DnsService> {
    let groups = config.dns.upstream_groups()?;

    let (chain, bootstrap_result) =
        build_chain(&config.dns.bootstrap.servers, config.dns.bootstrap.timeout());
    if let Err(e) = bootstrap_result {
        warn!(error = %e, "Some bootstrap servers failed to construct");
    }
    if chain.resolver.is_empty() {
        warn!("Bootstrap chain is empty; hostname upstreams will fail to resolve");
    }

    let mut pool = UpstreamPool::new();
    let bootstrap: Arc<dyn BootstrapResolver> = chain.resolver.clone();
    let routing_options = RoutingOptions {
        timeout: config.dns.upstream_timeout(),
        bootstrap,
    };

    let (table, build_result) = build_routing_table(&groups, &mut pool, &routing_options);
    if let Err(e) = build_result {
        warn!(error = %e, "Routing table built partially, continuing with usable routes");
    }
    if table.is_unroutable() {
        anyhow::bail!("no usable upstream routes were built");
    }

    info!(
        groups = groups.len(),
        upstreams = pool.len(),
        bootstrap_servers = chain.resolver.len(),
        "Routing table built"
    );

    let select = Arc::new(SelectUpstreamsUseCase::new(Arc::new(table)));
    let relay = Arc::new(DnsRelay::new(select));

    Ok(DnsService::new(
        relay,
        chain.closers,
        DnsServiceConfig {
            listen_addresses: config.server.listen_addresses.clone(),
            bind_retry: config.server.bind_retry.clone(),
        },
    ))
}
