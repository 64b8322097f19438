pub mod bind_retry;
pub mod bootstrap;
pub mod relay;
pub mod routing;
pub mod service;
pub mod upstream;

pub use bind_retry::bind_with_retry;
pub use bootstrap::{build_chain, BootstrapChain};
pub use relay::DnsRelay;
pub use routing::{build_routing_table, ClientRoutes, RoutingOptions, RoutingTable};
pub use service::{DnsService, DnsServiceConfig};
pub use upstream::{Upstream, UpstreamOptions, UpstreamPool};
