use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use argent_dns_application::{BootstrapResolver, UpstreamHandle, UpstreamRouter};
use argent_dns_domain::dns_name::{fqdn_suffixes, normalize_fqdn};
use argent_dns_domain::{DomainError, GroupName, UpstreamGroup};
use ipnetwork::IpNetwork;
use tracing::debug;

use super::upstream::{Upstream, UpstreamOptions, UpstreamPool};

/// Routes for one client entry: the catch-all list used when no domain rule
/// applies, plus two domain-keyed maps. The reserved and specified maps
/// receive identical writes by construction; both are kept because external
/// consumers may read them differently.
#[derive(Debug, Default)]
pub struct ClientRoutes {
    catch_all: Vec<Arc<Upstream>>,
    reserved_domain_upstreams: HashMap<Arc<str>, Vec<Arc<Upstream>>>,
    specified_domain_upstreams: HashMap<Arc<str>, Vec<Arc<Upstream>>>,
}

impl ClientRoutes {
    fn add_catch_all(&mut self, upstream: Arc<Upstream>) {
        self.catch_all.push(upstream);
    }

    fn add_domain(&mut self, fqdn: Arc<str>, upstream: Arc<Upstream>) {
        self.reserved_domain_upstreams
            .entry(Arc::clone(&fqdn))
            .or_default()
            .push(Arc::clone(&upstream));
        self.specified_domain_upstreams
            .entry(fqdn)
            .or_default()
            .push(upstream);
    }

    pub fn catch_all(&self) -> &[Arc<Upstream>] {
        &self.catch_all
    }

    /// The most specific domain entry matching `fqdn` or one of its parent
    /// suffixes.
    pub fn domain_match(&self, fqdn: &str) -> Option<&[Arc<Upstream>]> {
        fqdn_suffixes(fqdn).find_map(|suffix| {
            self.reserved_domain_upstreams
                .get(suffix)
                .map(|upstreams| upstreams.as_slice())
        })
    }

    pub fn reserved_domain_upstreams(&self) -> &HashMap<Arc<str>, Vec<Arc<Upstream>>> {
        &self.reserved_domain_upstreams
    }

    pub fn specified_domain_upstreams(&self) -> &HashMap<Arc<str>, Vec<Arc<Upstream>>> {
        &self.specified_domain_upstreams
    }

    pub fn is_empty(&self) -> bool {
        self.catch_all.is_empty() && self.reserved_domain_upstreams.is_empty()
    }
}

/// The immutable routing table consulted once per query. Built single-
/// threaded at startup; read concurrently afterwards without locking, which
/// is safe because nothing mutates it after the build completes.
///
/// The default (unmatched-client) entry and the optional private entry are
/// explicit fields rather than reserved keys of the prefix map.
#[derive(Debug, Default)]
pub struct RoutingTable {
    default: ClientRoutes,
    private: Option<ClientRoutes>,
    by_prefix: HashMap<IpNetwork, ClientRoutes>,
}

impl RoutingTable {
    pub fn default_routes(&self) -> &ClientRoutes {
        &self.default
    }

    pub fn private_routes(&self) -> Option<&ClientRoutes> {
        self.private.as_ref()
    }

    pub fn client_routes(&self, prefix: &IpNetwork) -> Option<&ClientRoutes> {
        self.by_prefix.get(prefix)
    }

    /// True when no query could ever produce an upstream.
    pub fn is_unroutable(&self) -> bool {
        self.default.is_empty() && self.by_prefix.values().all(ClientRoutes::is_empty)
    }

    /// Entries whose prefix contains `client`, most specific first, ending
    /// with the default entry.
    fn candidates(&self, client: IpAddr) -> Vec<&ClientRoutes> {
        let mut matched: Vec<(&IpNetwork, &ClientRoutes)> = self
            .by_prefix
            .iter()
            .filter(|(net, _)| net.contains(client))
            .collect();
        matched.sort_by(|a, b| b.0.prefix().cmp(&a.0.prefix()));

        let mut routes: Vec<&ClientRoutes> = matched.into_iter().map(|(_, r)| r).collect();
        routes.push(&self.default);
        routes
    }

    /// The ordered upstream list to try for a query: a domain-specific match
    /// wins over any catch-all, with entries consulted most specific first
    /// both times and the default entry last.
    pub fn upstreams_for(&self, client: IpAddr, question: &str) -> &[Arc<Upstream>] {
        let fqdn = normalize_fqdn(question);
        let candidates = self.candidates(client);

        for routes in &candidates {
            if let Some(upstreams) = routes.domain_match(&fqdn) {
                return upstreams;
            }
        }

        for routes in &candidates {
            if !routes.catch_all().is_empty() {
                return routes.catch_all();
            }
        }

        &[]
    }
}

impl UpstreamRouter for RoutingTable {
    fn route(&self, client: IpAddr, question: &str) -> Vec<Arc<dyn UpstreamHandle>> {
        self.upstreams_for(client, question)
            .iter()
            .map(|upstream| Arc::clone(upstream) as Arc<dyn UpstreamHandle>)
            .collect()
    }

    fn route_private(&self) -> Vec<Arc<dyn UpstreamHandle>> {
        self.private
            .as_ref()
            .map(|routes| {
                routes
                    .catch_all()
                    .iter()
                    .map(|upstream| Arc::clone(upstream) as Arc<dyn UpstreamHandle>)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Options shared by every upstream constructed during a table build.
#[derive(Debug, Clone)]
pub struct RoutingOptions {
    pub timeout: Duration,
    pub bootstrap: Arc<dyn BootstrapResolver>,
}

/// Builds the routing table from normalized groups, de-duplicating upstream
/// handles through `pool`.
///
/// A failing group does not abort the build: its error is collected,
/// annotated with the group name, and the rest of the table is still built.
/// The joined failures come back alongside the partial table and the caller
/// decides whether it is acceptable to run with.
pub fn build_routing_table(
    groups: &[UpstreamGroup],
    pool: &mut UpstreamPool,
    options: &RoutingOptions,
) -> (RoutingTable, Result<(), DomainError>) {
    let mut table = RoutingTable::default();
    let mut errors = Vec::new();

    for group in groups {
        let upstream_options = UpstreamOptions {
            group: group.name.clone(),
            timeout: options.timeout,
            bootstrap: Arc::clone(&options.bootstrap),
        };

        let upstream = match pool.get_or_create(&group.address, &upstream_options) {
            Ok(upstream) => upstream,
            Err(e) => {
                errors.push(DomainError::GroupBuild {
                    group: group.name.to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match &group.name {
            GroupName::Default => table.default.add_catch_all(upstream),
            GroupName::Private => table
                .private
                .get_or_insert_with(ClientRoutes::default)
                .add_catch_all(upstream),
            GroupName::Named(_) => {
                for (index, criteria) in group.match_criteria.iter().enumerate() {
                    if let Err(e) = criteria.validate() {
                        errors.push(DomainError::GroupBuild {
                            group: group.name.to_string(),
                            reason: format!("match at index {}: {}", index, e),
                        });
                        continue;
                    }

                    let entry = match criteria.client {
                        Some(prefix) => table.by_prefix.entry(prefix).or_default(),
                        None => &mut table.default,
                    };

                    match &criteria.question_domain {
                        None => entry.add_catch_all(Arc::clone(&upstream)),
                        Some(domain) => {
                            entry.add_domain(normalize_fqdn(domain), Arc::clone(&upstream))
                        }
                    }
                }
            }
        }

        debug!(group = %group.name, address = %group.address, "Routed upstream group");
    }

    (table, DomainError::join(errors))
}
