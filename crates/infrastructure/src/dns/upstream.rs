use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use argent_dns_application::{BootstrapResolver, UpstreamHandle};
use argent_dns_domain::{DnsEndpoint, DomainError, GroupName, Scheme, UpstreamAddr};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// Per-group options applied when constructing an upstream.
#[derive(Debug, Clone)]
pub struct UpstreamOptions {
    /// Group the upstream is being constructed for, kept for log context.
    pub group: GroupName,

    pub timeout: Duration,

    /// Resolves the hostname portion of upstream addresses.
    pub bootstrap: Arc<dyn BootstrapResolver>,
}

/// An established upstream connection handle, identified by its exact
/// configured address string. Immutable once created; shared by every group
/// and routing entry referencing the same address.
#[derive(Debug)]
pub struct Upstream {
    address: Arc<str>,
    endpoint: DnsEndpoint,
    timeout: Duration,
    group: GroupName,
    bootstrap: Arc<dyn BootstrapResolver>,
    resolved: OnceCell<SocketAddr>,
}

impl Upstream {
    fn new(address: &str, options: &UpstreamOptions) -> Result<Self, DomainError> {
        let endpoint: DnsEndpoint = address.parse()?;

        Ok(Self {
            address: address.into(),
            endpoint,
            timeout: options.timeout,
            group: options.group.clone(),
            bootstrap: options.bootstrap.clone(),
            resolved: OnceCell::new(),
        })
    }

    pub fn endpoint(&self) -> &DnsEndpoint {
        &self.endpoint
    }

    pub fn group(&self) -> &GroupName {
        &self.group
    }

    /// The socket address to exchange with. A hostname endpoint is resolved
    /// through the bootstrap chain on first use and the result kept for the
    /// lifetime of the handle; resolution failures are not kept, so the next
    /// exchange retries.
    async fn target_addr(&self) -> Result<SocketAddr, DomainError> {
        let (hostname, port) = match self.endpoint.addr() {
            UpstreamAddr::Resolved(addr) => return Ok(*addr),
            UpstreamAddr::Unresolved { hostname, port } => (hostname.as_ref(), *port),
        };

        self.resolved
            .get_or_try_init(|| async {
                let ips = self.bootstrap.resolve(hostname).await?;
                let ip = ips
                    .first()
                    .copied()
                    .ok_or_else(|| DomainError::NoAddresses(hostname.to_string()))?;

                debug!(group = %self.group, hostname, %ip, "Resolved upstream hostname via bootstrap");

                Ok(SocketAddr::new(ip, port))
            })
            .await
            .copied()
    }

    async fn exchange_udp(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let server = self.target_addr().await?;

        let bind_addr: SocketAddr = if server.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::Transport {
                server: server.to_string(),
                reason: format!("binding query socket: {}", e),
            }
        })?;

        tokio::time::timeout(self.timeout, socket.send_to(query, server))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::Transport {
                server: server.to_string(),
                reason: format!("sending query: {}", e),
            })?;

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let (len, from) = tokio::time::timeout(self.timeout, socket.recv_from(&mut recv_buf))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::Transport {
                server: server.to_string(),
                reason: format!("receiving response: {}", e),
            })?;

        if from.ip() != server.ip() {
            warn!(expected = %server, received_from = %from, "UDP response from unexpected source");
        }

        recv_buf.truncate(len);
        Ok(recv_buf)
    }

    async fn exchange_tcp(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let server = self.target_addr().await?;

        let exchange = async {
            let mut stream = TcpStream::connect(server).await?;

            let len = u16::try_from(query.len())
                .map_err(|_| std::io::Error::other("query too large for TCP framing"))?;
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(query).await?;

            let response_len = stream.read_u16().await? as usize;
            let mut response = vec![0u8; response_len];
            stream.read_exact(&mut response).await?;

            Ok::<_, std::io::Error>(response)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.to_string(),
            })?
            .map_err(|e| DomainError::Transport {
                server: server.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl UpstreamHandle for Upstream {
    fn address(&self) -> &str {
        &self.address
    }

    async fn exchange(&self, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        match self.endpoint.scheme() {
            Scheme::Udp => self.exchange_udp(query).await,
            Scheme::Tcp => self.exchange_tcp(query).await,
            other => Err(DomainError::UnsupportedTransport {
                scheme: other.as_str(),
            }),
        }
    }
}

/// Owns creation and de-duplication of upstream handles. The key is the
/// configured address string exactly as written, not a semantic identity:
/// two addresses differing only in a trailing slash are distinct upstreams.
///
/// Only written during the single-threaded build phase; the handles it hands
/// out are shared read-only afterwards.
#[derive(Debug, Default)]
pub struct UpstreamPool {
    upstreams: HashMap<Arc<str>, Arc<Upstream>>,
}

impl UpstreamPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handle for `address` or constructs one with
    /// `options`. Construction failures are not cached: a later call with
    /// the same address attempts construction again.
    pub fn get_or_create(
        &mut self,
        address: &str,
        options: &UpstreamOptions,
    ) -> Result<Arc<Upstream>, DomainError> {
        if let Some(existing) = self.upstreams.get(address) {
            return Ok(Arc::clone(existing));
        }

        let upstream = Arc::new(Upstream::new(address, options)?);
        self.upstreams
            .insert(Arc::clone(&upstream.address), Arc::clone(&upstream));

        debug!(address, group = %options.group, "Created upstream");

        Ok(upstream)
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}
