//! Hostname resolution with resolver fallback.
//!
//! The chain asks the system resolver first. Only if that yields nothing
//! does it walk the configured resolver addresses, strictly in order: each
//! one is dialed over UDP and, if dialable, queried. The first resolver to
//! answer without error wins, even with an empty answer.

use crate::error::{Error, Result};
use crate::probe::dial_udp;
use hickory_resolver::{
    TokioResolver,
    config::{NameServerConfig, ResolverConfig},
    name_server::TokioConnectionProvider,
    proto::xfer::Protocol,
};
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Reachability check applied to each configured resolver before use.
pub const RESOLVER_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Future returned by [`Resolve::resolve`].
pub type Lookup = Pin<Box<dyn Future<Output = io::Result<Vec<IpAddr>>> + Send>>;

/// Future returned by [`Connect::connect`].
pub type Connecting = Pin<Box<dyn Future<Output = io::Result<Box<dyn Resolve>>> + Send>>;

/// Resolves a hostname to IP addresses.
pub trait Resolve: Send + Sync {
    /// Looks up every IP address of `host`, in the order the backend
    /// returns them.
    fn resolve(&self, host: &str) -> Lookup;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, host: &str) -> Lookup {
        (**self).resolve(host)
    }
}

/// Dials a resolver address and hands back a [`Resolve`] bound to it.
pub trait Connect: Send + Sync {
    /// Dials `address` (`host:port`) within `timeout`.
    fn connect(&self, address: &str, timeout: Duration) -> Connecting;
}

impl<C: Connect + ?Sized> Connect for Arc<C> {
    fn connect(&self, address: &str, timeout: Duration) -> Connecting {
        (**self).connect(address, timeout)
    }
}

/// The operating system's resolver (`getaddrinfo` on the blocking pool).
///
/// An empty answer counts as a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str) -> Lookup {
        let host = host.to_string();
        Box::pin(async move {
            let domain = host.clone();
            let ips: Vec<IpAddr> = tokio::task::spawn_blocking(move || {
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|addrs| addrs.map(|addr| addr.ip()).collect::<Vec<_>>())
            })
            .await
            .map_err(io::Error::other)??;

            if ips.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses returned by getaddrinfo",
                ));
            }
            tracing::debug!(host = %domain, count = ips.len(), "System resolution complete");
            Ok(ips)
        })
    }
}

/// Dials resolvers over UDP and queries them with hickory-dns.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpNameservers;

impl Connect for UdpNameservers {
    fn connect(&self, address: &str, timeout: Duration) -> Connecting {
        let address = address.to_string();
        Box::pin(async move {
            let socket = dial_udp(address, timeout).await?;
            let server = socket.peer_addr()?;
            Ok(Box::new(NameserverResolver::new(server)) as Box<dyn Resolve>)
        })
    }
}

/// A hickory-dns resolver pinned to one nameserver.
#[derive(Clone)]
pub struct NameserverResolver {
    server: SocketAddr,
    resolver: TokioResolver,
}

impl NameserverResolver {
    /// Creates a resolver that only queries `server`, over UDP, once.
    #[must_use]
    pub fn new(server: SocketAddr) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().attempts = 1;

        Self {
            server,
            resolver: builder.build(),
        }
    }

    /// Returns the nameserver this resolver queries.
    #[must_use]
    pub const fn server(&self) -> SocketAddr {
        self.server
    }
}

impl std::fmt::Debug for NameserverResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameserverResolver")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl Resolve for NameserverResolver {
    fn resolve(&self, host: &str) -> Lookup {
        let host = host.to_string();
        let this = self.clone();
        Box::pin(async move {
            let lookup = match this.resolver.lookup_ip(host.as_str()).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    tracing::debug!(
                        host = %host,
                        server = %this.server,
                        error = %e,
                        "Lookup failed"
                    );
                    return Err(io::Error::other(e));
                }
            };
            Ok(lookup.iter().collect())
        })
    }
}

/// System resolver first, then each configured resolver in order.
#[derive(Clone)]
pub struct ResolverChain {
    system: Arc<dyn Resolve>,
    upstream: Arc<dyn Connect>,
}

impl ResolverChain {
    /// Creates a chain from explicit backends.
    #[must_use]
    pub fn new(system: Arc<dyn Resolve>, upstream: Arc<dyn Connect>) -> Self {
        Self { system, upstream }
    }

    /// Resolves `host`, falling back through `resolvers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] wrapping the last underlying error if
    /// the system resolver and every configured resolver failed.
    pub async fn resolve(&self, host: &str, resolvers: &[String]) -> Result<Vec<IpAddr>> {
        let mut last_err = match self.system.resolve(host).await {
            Ok(ips) if !ips.is_empty() => return Ok(ips),
            Ok(_) => io::Error::new(
                io::ErrorKind::NotFound,
                "system resolver returned no addresses",
            ),
            Err(e) => e,
        };

        for address in resolvers {
            let dialing = self.upstream.connect(address, RESOLVER_DIAL_TIMEOUT);
            let resolver = match dialing.await {
                Ok(resolver) => resolver,
                Err(e) => {
                    tracing::debug!(resolver = %address, error = %e, "Resolver not dialable");
                    last_err = e;
                    continue;
                }
            };

            match resolver.resolve(host).await {
                Ok(ips) => {
                    tracing::debug!(
                        host = %host,
                        resolver = %address,
                        count = ips.len(),
                        "Resolved via fallback"
                    );
                    return Ok(ips);
                }
                Err(e) => last_err = e,
            }
        }

        Err(Error::Resolution {
            host: host.to_string(),
            source: last_err,
        })
    }
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new(Arc::new(SystemResolver), Arc::new(UdpNameservers))
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    const fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
    }

    fn copy_err(e: &io::Error) -> io::Error {
        io::Error::new(e.kind(), e.to_string())
    }

    struct StaticResolve(io::Result<Vec<IpAddr>>);

    impl Resolve for StaticResolve {
        fn resolve(&self, _host: &str) -> Lookup {
            let result = match &self.0 {
                Ok(ips) => Ok(ips.clone()),
                Err(e) => Err(copy_err(e)),
            };
            Box::pin(async move { result })
        }
    }

    /// Upstreams keyed by address; records every dial and its timeout.
    #[derive(Default)]
    struct Upstreams {
        answers: Vec<(&'static str, io::Result<Vec<IpAddr>>)>,
        dialed: Mutex<Vec<String>>,
        timeouts: Mutex<Vec<Duration>>,
    }

    impl Connect for Upstreams {
        fn connect(&self, address: &str, timeout: Duration) -> Connecting {
            self.dialed.lock().unwrap().push(address.to_string());
            self.timeouts.lock().unwrap().push(timeout);
            let answer = self
                .answers
                .iter()
                .find(|(a, _)| *a == address)
                .map(|(_, r)| match r {
                    Ok(ips) => Ok(ips.clone()),
                    Err(e) => Err(copy_err(e)),
                });
            let result = answer.map_or_else(
                || Err(io::Error::new(io::ErrorKind::ConnectionRefused, "undialable")),
                |r| Ok(Box::new(StaticResolve(r)) as Box<dyn Resolve>),
            );
            Box::pin(async move { result })
        }
    }

    fn failing_system() -> Arc<dyn Resolve> {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such host");
        Arc::new(StaticResolve(Err(err)))
    }

    #[tokio::test]
    async fn system_success_short_circuits() {
        let system = Arc::new(StaticResolve(Ok(vec![ip(1)])));
        let upstream = Arc::new(Upstreams::default());
        let chain = ResolverChain::new(system, upstream.clone());

        let ips = chain
            .resolve("a.example", &["invalid:53".into(), "also-invalid:53".into()])
            .await
            .unwrap();

        assert_eq!(ips, vec![ip(1)]);
        assert!(upstream.dialed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_system_answer_falls_back() {
        let upstream = Arc::new(Upstreams {
            answers: vec![("b:53", Ok(vec![ip(2)]))],
            ..Default::default()
        });
        let chain = ResolverChain::new(Arc::new(StaticResolve(Ok(Vec::new()))), upstream);

        let ips = chain.resolve("a.example", &["b:53".into()]).await;
        assert_eq!(ips.unwrap(), vec![ip(2)]);
    }

    #[tokio::test]
    async fn undialable_resolver_is_skipped_in_order() {
        let upstream = Arc::new(Upstreams {
            answers: vec![("b:53", Ok(vec![ip(2), ip(3)]))],
            ..Default::default()
        });
        let chain = ResolverChain::new(failing_system(), upstream.clone());

        let ips = chain
            .resolve("a.example", &["a:53".into(), "b:53".into(), "c:53".into()])
            .await
            .unwrap();

        assert_eq!(ips, vec![ip(2), ip(3)]);
        assert_eq!(*upstream.dialed.lock().unwrap(), vec!["a:53", "b:53"]);
    }

    #[tokio::test]
    async fn resolver_dial_uses_fixed_timeout() {
        let upstream = Arc::new(Upstreams {
            answers: vec![("b:53", Ok(vec![ip(4)]))],
            ..Default::default()
        });
        let chain = ResolverChain::new(failing_system(), upstream.clone());

        let ips = chain
            .resolve("t.example", &["a:53".into(), "b:53".into()])
            .await
            .unwrap();

        assert_eq!(ips, vec![ip(4)]);
        assert_eq!(RESOLVER_DIAL_TIMEOUT.as_millis(), 5000);
        let timeouts = upstream.timeouts.lock().unwrap();
        assert_eq!(*timeouts, vec![RESOLVER_DIAL_TIMEOUT; 2]);
    }

    #[tokio::test]
    async fn lookup_error_continues_to_next() {
        let upstream = Arc::new(Upstreams {
            answers: vec![
                ("a:53", Err(io::Error::other("servfail"))),
                ("b:53", Ok(vec![ip(9)])),
            ],
            ..Default::default()
        });
        let chain = ResolverChain::new(failing_system(), upstream.clone());

        let ips = chain
            .resolve("x.example", &["a:53".into(), "b:53".into()])
            .await
            .unwrap();

        assert_eq!(ips, vec![ip(9)]);
        assert_eq!(*upstream.dialed.lock().unwrap(), vec!["a:53", "b:53"]);
    }

    #[tokio::test]
    async fn first_answer_wins_even_if_empty() {
        let upstream = Arc::new(Upstreams {
            answers: vec![("a:53", Ok(Vec::new())), ("b:53", Ok(vec![ip(2)]))],
            ..Default::default()
        });
        let chain = ResolverChain::new(failing_system(), upstream.clone());

        let ips = chain
            .resolve("x.example", &["a:53".into(), "b:53".into()])
            .await
            .unwrap();

        assert!(ips.is_empty());
        assert_eq!(*upstream.dialed.lock().unwrap(), vec!["a:53"]);
    }

    #[tokio::test]
    async fn all_failures_wrap_last_error() {
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "last one");
        let upstream = Arc::new(Upstreams {
            answers: vec![("b:53", Err(timed_out))],
            ..Default::default()
        });
        let chain = ResolverChain::new(failing_system(), upstream);

        let err = chain
            .resolve("gone.example", &["a:53".into(), "b:53".into()])
            .await
            .unwrap_err();

        match err {
            Error::Resolution { host, source } => {
                assert_eq!(host, "gone.example");
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_list_reports_system_error() {
        let chain = ResolverChain::new(failing_system(), Arc::new(Upstreams::default()));
        let err = chain.resolve("gone.example", &[]).await.unwrap_err();
        assert!(err.is_resolution());
        assert!(err.to_string().contains("no such host"));
    }

    #[tokio::test]
    async fn system_resolver_handles_localhost() {
        let ips = SystemResolver.resolve("localhost").await.unwrap();
        assert!(ips.iter().all(IpAddr::is_loopback));
    }

    #[tokio::test]
    async fn udp_nameservers_reject_bad_address() {
        let timeout = Duration::from_secs(1);
        let dialing = UdpNameservers.connect("not an address", timeout);
        assert!(dialing.await.is_err());
    }

    #[tokio::test]
    async fn udp_nameservers_bind_to_dialed_peer() {
        let server: SocketAddr = "127.0.0.1:53".parse().unwrap();
        assert_eq!(NameserverResolver::new(server).server(), server);
    }
}
