pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;

pub use dns::{BootstrapConfig, DnsConfig, GroupConfig, MatchRule};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::{BindRetryConfig, ServerConfig};
