use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use argent_dns_application::{BootstrapResolver, ResolverCloser};
use argent_dns_domain::DomainError;
use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::debug;

/// Maximum bootstrap response size we accept.
const MAX_RESPONSE_SIZE: usize = 4096;

/// A plain-DNS resolver bound to one bootstrap server. The query socket is
/// bound at construction so a dead local network stack surfaces as a
/// construction failure rather than a resolution failure.
#[derive(Debug)]
pub struct UdpResolver {
    server: SocketAddr,
    timeout: Duration,
    /// `None` once the resolver has been closed.
    socket: Mutex<Option<UdpSocket>>,
}

impl UdpResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Result<Self, DomainError> {
        if server.port() == 0 {
            return Err(DomainError::InvalidUpstreamAddress(server.to_string()));
        }

        let bind_addr: SocketAddr = if server.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = std::net::UdpSocket::bind(bind_addr).map_err(|e| DomainError::Bind {
            addr: bind_addr.to_string(),
            reason: e.to_string(),
        })?;
        socket.set_nonblocking(true).map_err(|e| DomainError::Bind {
            addr: bind_addr.to_string(),
            reason: e.to_string(),
        })?;
        let socket = UdpSocket::from_std(socket).map_err(|e| DomainError::Bind {
            addr: bind_addr.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            server,
            timeout,
            socket: Mutex::new(Some(socket)),
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    fn build_query(name: &Name, record_type: RecordType) -> Result<(u16, Vec<u8>), DomainError> {
        let mut query = Query::new();
        query.set_name(name.clone());
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDomainName(format!("serializing bootstrap query: {}", e))
        })?;

        Ok((id, buf))
    }

    /// One question to the bootstrap server; answers filtered to addresses.
    async fn lookup(
        &self,
        name: &Name,
        record_type: RecordType,
    ) -> Result<Vec<IpAddr>, DomainError> {
        let (id, query) = Self::build_query(name, record_type)?;

        let guard = self.socket.lock().await;
        let socket = guard.as_ref().ok_or_else(|| DomainError::ResolverClosed {
            server: self.server.to_string(),
        })?;

        let exchange = async {
            socket.send_to(&query, self.server).await.map_err(|e| {
                DomainError::Transport {
                    server: self.server.to_string(),
                    reason: format!("sending query: {}", e),
                }
            })?;

            let mut buf = vec![0u8; MAX_RESPONSE_SIZE];
            loop {
                let (len, from) =
                    socket
                        .recv_from(&mut buf)
                        .await
                        .map_err(|e| DomainError::Transport {
                            server: self.server.to_string(),
                            reason: format!("receiving response: {}", e),
                        })?;

                if from.ip() != self.server.ip() {
                    continue;
                }

                let Ok(message) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                if message.id() != id || message.message_type() != MessageType::Response {
                    continue;
                }

                if message.response_code() != ResponseCode::NoError {
                    return Err(DomainError::Transport {
                        server: self.server.to_string(),
                        reason: format!("response code {}", message.response_code()),
                    });
                }

                let addrs: Vec<IpAddr> = message
                    .answers()
                    .iter()
                    .filter_map(|record| match record.data() {
                        RData::A(a) => Some(IpAddr::V4(a.0)),
                        RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
                        _ => None,
                    })
                    .collect();

                return Ok(addrs);
            }
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: self.server.to_string(),
            })?
    }
}

#[async_trait]
impl BootstrapResolver for UdpResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, DomainError> {
        let name = Name::from_str(hostname)
            .map_err(|e| DomainError::InvalidDomainName(format!("'{}': {}", hostname, e)))?;

        let mut addrs = Vec::new();
        let mut errors = Vec::new();
        for record_type in [RecordType::A, RecordType::AAAA] {
            match self.lookup(&name, record_type).await {
                Ok(found) => addrs.extend(found),
                Err(e @ DomainError::ResolverClosed { .. }) => return Err(e),
                Err(e) => errors.push(e),
            }
        }

        if addrs.is_empty() {
            return Err(match DomainError::join(errors) {
                Err(e) => e,
                Ok(()) => DomainError::NoAddresses(hostname.to_string()),
            });
        }

        debug!(server = %self.server, hostname, count = addrs.len(), "Bootstrap resolution");

        Ok(addrs)
    }
}

#[async_trait]
impl ResolverCloser for UdpResolver {
    async fn close(&self) -> Result<(), DomainError> {
        let mut guard = self.socket.lock().await;
        if guard.take().is_some() {
            debug!(server = %self.server, "Closed bootstrap resolver");
        }

        Ok(())
    }
}
