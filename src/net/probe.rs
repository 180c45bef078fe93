//! Listener reachability probe.
//!
//! Any completed TCP connect counts as reachable; no protocol handshake is
//! attempted. Each attempt is bounded by the connect timeout and the number of
//! attempts is bounded, so a probe always terminates.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpStream;
use tokio::time;

use crate::config::ProbeConfig;
use crate::resilience::backoff::calculate_backoff;

/// Probe a bind address, retrying with backoff up to `config.attempts` times.
pub async fn tcp_reachable(address: &str, config: &ProbeConfig) -> bool {
    let Some(target) = dial_target(address) else {
        tracing::debug!(address = %address, "Unparseable listener address");
        return false;
    };

    for attempt in 1..=config.attempts {
        match time::timeout(config.connect_timeout(), TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(address = %address, attempt, "Listener reachable");
                return true;
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %address, attempt, error = %e, "Listener not reachable");
            }
            Err(_) => {
                tracing::debug!(address = %address, attempt, "Listener probe timed out");
            }
        }

        if attempt < config.attempts {
            time::sleep(calculate_backoff(
                attempt,
                config.retry_base_delay_ms,
                config.retry_max_delay_ms,
            ))
            .await;
        }
    }

    false
}

/// Wildcard bind addresses are dialled on loopback.
fn dial_target(address: &str) -> Option<SocketAddr> {
    let mut addr: SocketAddr = address.parse().ok()?;
    if addr.ip().is_unspecified() {
        addr.set_ip(match addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        });
    }
    Some(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio::net::TcpListener;

    fn fast_probe() -> ProbeConfig {
        ProbeConfig {
            connect_timeout_ms: 200,
            attempts: 3,
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 20,
        }
    }

    #[test]
    fn wildcard_is_dialled_on_loopback() {
        assert_eq!(
            dial_target("0.0.0.0:8080"),
            Some("127.0.0.1:8080".parse().unwrap())
        );
        assert_eq!(dial_target("[::]:8080"), Some("[::1]:8080".parse().unwrap()));
        assert_eq!(dial_target("nope"), None);
    }

    #[tokio::test]
    async fn bound_listener_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        assert!(tcp_reachable(&address, &fast_probe()).await);
    }

    #[tokio::test]
    async fn closed_port_gives_up_after_bounded_attempts() {
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let started = Instant::now();
        assert!(!tcp_reachable(&address, &fast_probe()).await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
