use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use argent_dns_application::ResolverCloser;
use argent_dns_domain::{BindRetryConfig, DomainError};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::bind_retry::bind_with_retry;
use super::relay::DnsRelay;

pub struct DnsServiceConfig {
    pub listen_addresses: Vec<SocketAddr>,
    pub bind_retry: BindRetryConfig,
}

/// The running DNS service: listener workers feeding the relay, plus the
/// bootstrap resources to release at shutdown.
pub struct DnsService {
    relay: Arc<DnsRelay>,
    closers: Vec<Arc<dyn ResolverCloser>>,
    config: DnsServiceConfig,
    cancel: CancellationToken,
    workers: JoinSet<()>,
}

impl DnsService {
    pub fn new(
        relay: Arc<DnsRelay>,
        closers: Vec<Arc<dyn ResolverCloser>>,
        config: DnsServiceConfig,
    ) -> Self {
        Self {
            relay,
            closers,
            config,
            cancel: CancellationToken::new(),
            workers: JoinSet::new(),
        }
    }

    /// Binds every listen address, each guarded by the bind retry policy,
    /// and spawns the UDP and TCP workers.
    pub async fn start(&mut self) -> Result<(), DomainError> {
        for addr in self.config.listen_addresses.clone() {
            let udp = bind_with_retry(
                || create_udp_socket(addr),
                &self.config.bind_retry,
                &self.cancel,
            )
            .await
            .map_err(|e| DomainError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

            let tcp = bind_with_retry(
                || create_tcp_listener(addr),
                &self.config.bind_retry,
                &self.cancel,
            )
            .await
            .map_err(|e| DomainError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

            let udp = UdpSocket::from_std(udp).map_err(|e| DomainError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;
            let tcp = TcpListener::from_std(tcp).map_err(|e| DomainError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

            info!(%addr, "Listening for DNS requests");

            self.workers.spawn(run_udp_worker(
                udp,
                Arc::clone(&self.relay),
                self.cancel.clone(),
            ));
            self.workers.spawn(run_tcp_worker(
                tcp,
                Arc::clone(&self.relay),
                self.cancel.clone(),
            ));
        }

        Ok(())
    }

    /// Stops the workers and releases the bootstrap resolvers, joining any
    /// close failures.
    pub async fn shutdown(&mut self) -> Result<(), DomainError> {
        self.cancel.cancel();
        while self.workers.join_next().await.is_some() {}

        let mut errors = Vec::new();
        for closer in &self.closers {
            if let Err(e) = closer.close().await {
                errors.push(e);
            }
        }

        info!("DNS service stopped");

        DomainError::join(errors)
    }
}

fn create_udp_socket(addr: SocketAddr) -> io::Result<std::net::UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

fn create_tcp_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

async fn run_udp_worker(socket: UdpSocket, relay: Arc<DnsRelay>, cancel: CancellationToken) {
    let socket = Arc::new(socket);
    let mut buf = [0u8; 4096];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, from)) => {
                    let query: Arc<[u8]> = Arc::from(&buf[..len]);
                    let relay = Arc::clone(&relay);
                    let socket = Arc::clone(&socket);
                    tokio::spawn(async move {
                        if let Some(response) = relay.handle_query(&query, from.ip()).await {
                            let _ = socket.send_to(&response, from).await;
                        }
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "UDP recv error");
                    break;
                }
            }
        }
    }
}

async fn run_tcp_worker(listener: TcpListener, relay: Arc<DnsRelay>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_tcp_connection(stream, peer, Arc::clone(&relay)));
                }
                Err(e) => {
                    error!(error = %e, "TCP accept error");
                    break;
                }
            }
        }
    }
}

async fn handle_tcp_connection(mut stream: TcpStream, peer: SocketAddr, relay: Arc<DnsRelay>) {
    loop {
        let len = match stream.read_u16().await {
            Ok(len) => len as usize,
            // Closed between queries, nothing to report.
            Err(_) => return,
        };

        let mut query = vec![0u8; len];
        if let Err(e) = stream.read_exact(&mut query).await {
            warn!(%peer, error = %e, "TCP query read failed");
            return;
        }

        let Some(response) = relay.handle_query(&query, peer.ip()).await else {
            return;
        };

        let Ok(response_len) = u16::try_from(response.len()) else {
            warn!(%peer, "Response too large for TCP framing");
            return;
        };
        if stream.write_all(&response_len.to_be_bytes()).await.is_err()
            || stream.write_all(&response).await.is_err()
        {
            return;
        }
    }
}
