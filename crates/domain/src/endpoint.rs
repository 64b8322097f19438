use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::DomainError;

/// Transport scheme of an upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Udp,
    Tcp,
    Tls,
    Https,
    Quic,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
            Self::Tls => "tls",
            Self::Https => "https",
            Self::Quic => "doq",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Udp | Self::Tcp => 53,
            Self::Tls | Self::Quic => 853,
            Self::Https => 443,
        }
    }

    /// Splits a known `scheme://` prefix off `s`.
    fn strip(s: &str) -> Option<(Scheme, &str)> {
        let (prefix, rest) = s.split_once("://")?;
        let scheme = match prefix {
            "udp" => Self::Udp,
            "tcp" => Self::Tcp,
            "tls" => Self::Tls,
            "https" => Self::Https,
            "doq" | "quic" => Self::Quic,
            _ => return None,
        };
        Some((scheme, rest))
    }
}

/// The host part of an upstream endpoint, which may still need resolving
/// through the bootstrap chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl UpstreamAddr {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Resolved(addr) => Some(*addr),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Resolved(addr) => addr.port(),
            Self::Unresolved { port, .. } => *port,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }

    /// Returns `(hostname, port)` if this address still needs resolution.
    pub fn unresolved_parts(&self) -> Option<(&str, u16)> {
        match self {
            Self::Unresolved { hostname, port } => Some((hostname, *port)),
            Self::Resolved(_) => None,
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(addr) => write!(f, "{}", addr),
            Self::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

/// A parsed upstream endpoint: scheme plus host address, with the original
/// URL kept for DoH endpoints since those carry a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsEndpoint {
    scheme: Scheme,
    addr: UpstreamAddr,
    url: Option<Arc<str>>,
}

impl DnsEndpoint {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn addr(&self) -> &UpstreamAddr {
        &self.addr
    }

    /// The full URL for DoH endpoints, `None` for everything else.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn needs_resolution(&self) -> bool {
        self.addr.is_unresolved()
    }

    /// A copy of this endpoint with the host part pinned to `resolved`.
    pub fn with_resolved_addr(&self, resolved: SocketAddr) -> Self {
        Self {
            scheme: self.scheme,
            addr: UpstreamAddr::Resolved(resolved),
            url: self.url.clone(),
        }
    }
}

impl fmt::Display for DnsEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{}", url),
            None => write!(f, "{}://{}", self.scheme.as_str(), self.addr),
        }
    }
}

/// Splits `s` into host and port, defaulting the port when absent. Handles
/// `[v6]:port`, raw IPv6 literals, `host:port`, and bare hosts.
fn split_host_port(s: &str, default_port: u16) -> Result<(&str, u16), DomainError> {
    if s.is_empty() {
        return Err(DomainError::InvalidUpstreamAddress(s.to_string()));
    }

    if let Some(rest) = s.strip_prefix('[') {
        let Some((host, after)) = rest.split_once(']') else {
            return Err(DomainError::InvalidUpstreamAddress(s.to_string()));
        };
        return match after.strip_prefix(':') {
            None if after.is_empty() => Ok((host, default_port)),
            Some(port_str) => match port_str.parse::<u16>() {
                Ok(port) => Ok((host, port)),
                Err(_) => Err(DomainError::InvalidUpstreamAddress(s.to_string())),
            },
            None => Err(DomainError::InvalidUpstreamAddress(s.to_string())),
        };
    }

    // A raw IPv6 literal contains colons but none of them starts a port.
    if s.parse::<IpAddr>().is_ok() {
        return Ok((s, default_port));
    }

    match s.rsplit_once(':') {
        Some((host, port_str)) if !host.is_empty() => match port_str.parse::<u16>() {
            Ok(port) => Ok((host, port)),
            Err(_) => Err(DomainError::InvalidUpstreamAddress(s.to_string())),
        },
        Some(_) => Err(DomainError::InvalidUpstreamAddress(s.to_string())),
        None => Ok((s, default_port)),
    }
}

fn parse_addr(host: &str, port: u16) -> UpstreamAddr {
    match host.parse::<IpAddr>() {
        Ok(ip) => UpstreamAddr::Resolved(SocketAddr::new(ip, port)),
        Err(_) => UpstreamAddr::Unresolved {
            hostname: host.into(),
            port,
        },
    }
}

impl FromStr for DnsEndpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = match Scheme::strip(s) {
            Some(parts) => parts,
            // A bare address is plain DNS over UDP.
            None if !s.contains("://") => (Scheme::Udp, s),
            None => return Err(DomainError::UnsupportedScheme(s.to_string())),
        };

        if scheme == Scheme::Https {
            let authority = rest.split('/').next().unwrap_or(rest);
            let (host, port) = split_host_port(authority, scheme.default_port())?;
            if host.is_empty() {
                return Err(DomainError::InvalidUpstreamAddress(s.to_string()));
            }
            return Ok(Self {
                scheme,
                addr: parse_addr(host, port),
                url: Some(s.into()),
            });
        }

        let (host, port) = split_host_port(rest, scheme.default_port())?;
        if host.is_empty() {
            return Err(DomainError::InvalidUpstreamAddress(s.to_string()));
        }

        Ok(Self {
            scheme,
            addr: parse_addr(host, port),
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_socket_addr() {
        let ep: DnsEndpoint = "8.8.8.8:53".parse().unwrap();
        assert_eq!(ep.scheme(), Scheme::Udp);
        assert_eq!(
            ep.addr().socket_addr(),
            Some("8.8.8.8:53".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_bare_ip_defaults_port() {
        let ep: DnsEndpoint = "9.9.9.10".parse().unwrap();
        assert_eq!(ep.addr().port(), 53);
    }

    #[test]
    fn test_parse_udp_hostname() {
        let ep: DnsEndpoint = "udp://dns.example.com:5353".parse().unwrap();
        assert!(ep.needs_resolution());
        assert_eq!(ep.addr().unresolved_parts(), Some(("dns.example.com", 5353)));
    }

    #[test]
    fn test_parse_tls_defaults_to_853() {
        let ep: DnsEndpoint = "tls://94.140.14.140".parse().unwrap();
        assert_eq!(ep.scheme(), Scheme::Tls);
        assert_eq!(ep.addr().port(), 853);
    }

    #[test]
    fn test_parse_https_keeps_url() {
        let ep: DnsEndpoint = "https://unfiltered.adguard-dns.com/dns-query"
            .parse()
            .unwrap();
        assert_eq!(ep.scheme(), Scheme::Https);
        assert_eq!(ep.url(), Some("https://unfiltered.adguard-dns.com/dns-query"));
        assert_eq!(
            ep.addr().unresolved_parts(),
            Some(("unfiltered.adguard-dns.com", 443))
        );
    }

    #[test]
    fn test_parse_doq() {
        let ep: DnsEndpoint = "doq://dns.example.com".parse().unwrap();
        assert_eq!(ep.scheme(), Scheme::Quic);
        assert_eq!(ep.addr().port(), 853);
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let ep: DnsEndpoint = "udp://[2620:fe::10]:53".parse().unwrap();
        assert_eq!(ep.addr().socket_addr(), Some("[2620:fe::10]:53".parse().unwrap()));
    }

    #[test]
    fn test_parse_raw_ipv6() {
        let ep: DnsEndpoint = "2620:fe::10".parse().unwrap();
        assert_eq!(ep.addr().port(), 53);
        assert!(!ep.needs_resolution());
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let err = "sctp://8.8.8.8:53".parse::<DnsEndpoint>().unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!("udp://".parse::<DnsEndpoint>().is_err());
        assert!("".parse::<DnsEndpoint>().is_err());
    }

    #[test]
    fn test_with_resolved_addr() {
        let ep: DnsEndpoint = "tls://dns.example.com".parse().unwrap();
        let resolved = ep.with_resolved_addr("1.2.3.4:853".parse().unwrap());
        assert!(!resolved.needs_resolution());
        assert_eq!(resolved.scheme(), Scheme::Tls);
    }
}
