//! UDP liveness probing.
//!
//! A probe only checks that a UDP socket can be associated with `ip:53`.
//! UDP is connectionless, so this is a local routing signal and says
//! nothing about whether a DNS server actually answers.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{ToSocketAddrs, UdpSocket, lookup_host};

/// The DNS port every probe targets.
pub const DNS_PORT: u16 = 53;

/// Future returned by [`Probe::probe`].
pub type Probing = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Liveness check for a DNS endpoint.
pub trait Probe: Send + Sync {
    /// Returns `true` if `ip:53` looks reachable within `timeout`.
    fn probe(&self, ip: IpAddr, timeout: Duration) -> Probing;
}

impl<P: Probe + ?Sized> Probe for Arc<P> {
    fn probe(&self, ip: IpAddr, timeout: Duration) -> Probing {
        (**self).probe(ip, timeout)
    }
}

/// Probes by associating a UDP socket with `ip:53`. One attempt, no retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpProbe;

impl Probe for UdpProbe {
    fn probe(&self, ip: IpAddr, timeout: Duration) -> Probing {
        Box::pin(async move {
            match dial_udp(SocketAddr::new(ip, DNS_PORT), timeout).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(ip = %ip, error = %e, "Liveness probe failed");
                    false
                }
            }
        })
    }
}

/// Resolves `address`, binds a local socket of the matching family and
/// connects it, all within `timeout`.
///
/// Only the first address `address` resolves to is dialed.
///
/// # Errors
///
/// Returns the underlying I/O error, or `TimedOut` if the deadline passes.
pub async fn dial_udp(address: impl ToSocketAddrs, timeout: Duration) -> io::Result<UdpSocket> {
    let dial = async {
        let mut targets = lookup_host(address).await?;
        let target = targets
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address to dial"))?;
        let socket = UdpSocket::bind(unspecified_for(target)).await?;
        socket.connect(target).await?;
        Ok::<_, io::Error>(socket)
    };

    tokio::time::timeout(timeout, dial)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))?
}

const fn unspecified_for(target: SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}
