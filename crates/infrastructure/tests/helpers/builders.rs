#![allow(dead_code)]
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use argent_dns_application::BootstrapResolver;
use argent_dns_domain::{DomainError, GroupName, MatchCriteria, UpstreamGroup};
use argent_dns_infrastructure::dns::RoutingOptions;
use async_trait::async_trait;

/// A bootstrap stub answering every hostname with a fixed address.
#[derive(Debug)]
pub struct StaticResolver(pub IpAddr);

#[async_trait]
impl BootstrapResolver for StaticResolver {
    async fn resolve(&self, _hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        Ok(vec![self.0])
    }
}

pub fn routing_options() -> RoutingOptions {
    RoutingOptions {
        timeout: Duration::from_secs(2),
        bootstrap: Arc::new(StaticResolver("192.0.2.53".parse().unwrap())),
    }
}

pub fn default_group(address: &str) -> UpstreamGroup {
    UpstreamGroup {
        name: GroupName::Default,
        address: address.into(),
        match_criteria: Vec::new(),
    }
}

pub fn private_group(address: &str) -> UpstreamGroup {
    UpstreamGroup {
        name: GroupName::Private,
        address: address.into(),
        match_criteria: Vec::new(),
    }
}

pub fn named_group(name: &str, address: &str, criteria: Vec<MatchCriteria>) -> UpstreamGroup {
    UpstreamGroup {
        name: GroupName::parse(name),
        address: address.into(),
        match_criteria: criteria,
    }
}

pub fn criteria(client: Option<&str>, question_domain: Option<&str>) -> MatchCriteria {
    MatchCriteria {
        client: client.map(|c| c.parse().unwrap()),
        question_domain: question_domain.map(Arc::from),
    }
}
