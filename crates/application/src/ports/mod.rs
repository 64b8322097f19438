pub mod bootstrap;
pub mod upstream_router;

pub use bootstrap::{BootstrapResolver, ResolverCloser};
pub use upstream_router::{UpstreamHandle, UpstreamRouter};
