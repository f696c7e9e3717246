// Neighbor discovery by probing nearby addresses

use std::future::Future;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Source of neighbor addresses. The range scanner below is the default;
/// a registry or gossip mechanism can stand in for it.
pub trait PeerDiscovery {
    fn discover(&self) -> impl Future<Output = Vec<String>> + Send;
}

/// Probes `host` with each offset added to its last octet, on each port
#[derive(Debug, Clone)]
pub struct RangeScanner {
    pub host: String,
    pub port: u16,
    pub ip_offsets: RangeInclusive<u8>,
    pub ports: RangeInclusive<u16>,
    pub probe_timeout: Duration,
}

impl RangeScanner {
    /// Candidate "host:port" addresses, excluding this node's own.
    /// Empty if `host` is not a dotted-quad IPv4 address.
    pub fn candidates(&self) -> Vec<String> {
        let octets = match self.host.parse::<Ipv4Addr>() {
            Ok(ip) => ip.octets(),
            Err(_) => {
                log::warn!("Cannot derive neighbors from host {:?}", self.host);
                return Vec::new();
            }
        };
        let prefix = format!("{}.{}.{}.", octets[0], octets[1], octets[2]);
        let own = format!("{}:{}", self.host, self.port);

        let mut candidates = Vec::new();
        for port in self.ports.clone() {
            for offset in self.ip_offsets.clone() {
                let Some(last) = octets[3].checked_add(offset) else {
                    continue;
                };
                let candidate = format!("{}{}:{}", prefix, last, port);
                if candidate != own && !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }
}

/// True if a TCP connection to `addr` succeeds within `probe_timeout`
pub async fn is_reachable(addr: &str, probe_timeout: Duration) -> bool {
    match timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            log::debug!("{} {}", addr, e);
            false
        }
        Err(_) => {
            log::debug!("{} probe timed out", addr);
            false
        }
    }
}

impl PeerDiscovery for RangeScanner {
    async fn discover(&self) -> Vec<String> {
        let mut neighbors = Vec::new();
        for candidate in self.candidates() {
            if is_reachable(&candidate, self.probe_timeout).await {
                neighbors.push(candidate);
            }
        }
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(host: &str, port: u16) -> RangeScanner {
        RangeScanner {
            host: host.to_string(),
            port,
            ip_offsets: 0..=1,
            ports: 5000..=5001,
            probe_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_candidates_skip_self() {
        let candidates = scanner("192.168.0.10", 5000).candidates();

        assert_eq!(candidates, vec![
            "192.168.0.11:5000".to_string(),
            "192.168.0.10:5001".to_string(),
            "192.168.0.11:5001".to_string(),
        ]);
    }

    #[test]
    fn test_candidates_require_dotted_quad() {
        assert!(scanner("localhost", 5000).candidates().is_empty());
        assert!(scanner("10.0.0", 5000).candidates().is_empty());
    }

    #[test]
    fn test_candidates_do_not_overflow_octet() {
        let candidates = scanner("10.0.0.255", 5000).candidates();
        assert_eq!(candidates, vec!["10.0.0.255:5001".to_string()]);
    }

    #[tokio::test]
    async fn test_discover_finds_listening_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let scanner = RangeScanner {
            host: "127.0.0.1".to_string(),
            port: 0,
            ip_offsets: 0..=0,
            ports: port..=port,
            probe_timeout: Duration::from_millis(500),
        };

        assert_eq!(scanner.discover().await, vec![format!("127.0.0.1:{}", port)]);
    }
}
