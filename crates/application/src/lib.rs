//! Argent DNS Application Layer
//!
//! Ports implemented by the infrastructure layer and the use cases the
//! dispatch path consumes.
pub mod ports;
pub mod use_cases;

pub use ports::{BootstrapResolver, ResolverCloser, UpstreamHandle, UpstreamRouter};
pub use use_cases::SelectUpstreamsUseCase;
