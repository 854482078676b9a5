//! Per-host processing.

use crate::chain::ResolverChain;
use crate::config::RunnerConfig;
use crate::probe::{DNS_PORT, Probe, UdpProbe};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Outcome of processing one host.
///
/// Either empty (no reachable resolver found) or the endpoint `ip:53`.
/// A finding does not record which input host produced it.
///
/// The endpoint prints as a socket address, so IPv6 findings come out
/// bracketed (`[2001:db8::53]:53`) rather than as a bare `ip:53` string.
/// IPv4 findings print exactly `ip:53`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Finding {
    endpoint: Option<SocketAddr>,
}

impl Finding {
    /// A finding with no endpoint.
    #[must_use]
    pub const fn empty() -> Self {
        Self { endpoint: None }
    }

    /// A finding for `ip:53`.
    #[must_use]
    pub const fn live(ip: IpAddr) -> Self {
        Self {
            endpoint: Some(SocketAddr::new(ip, DNS_PORT)),
        }
    }

    /// Returns `true` if no endpoint was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.endpoint.is_none()
    }

    /// The discovered endpoint, if any.
    #[must_use]
    pub const fn endpoint(&self) -> Option<SocketAddr> {
        self.endpoint
    }
}

/// Prints the endpoint, or nothing for an empty finding.
impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.endpoint
            .map_or_else(|| Ok(()), |endpoint| fmt::Display::fmt(&endpoint, f))
    }
}

/// Turns one host into a [`Finding`].
///
/// IP literals are probed directly. Hostnames go through the
/// [`ResolverChain`] and their addresses are probed in resolution order;
/// the first live one wins. Nothing is retried.
#[derive(Clone)]
pub struct Worker {
    config: Arc<RunnerConfig>,
    chain: ResolverChain,
    prober: Arc<dyn Probe>,
}

impl Worker {
    /// Creates a worker with the default network backends.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_backends(config, ResolverChain::default(), Arc::new(UdpProbe))
    }

    /// Creates a worker with explicit resolution and probing backends.
    #[must_use]
    pub fn with_backends(
        config: RunnerConfig,
        chain: ResolverChain,
        prober: Arc<dyn Probe>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chain,
            prober,
        }
    }

    /// Returns the worker's configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns a copy of this worker using `config` instead.
    #[must_use]
    pub(crate) fn reconfigured(&self, config: RunnerConfig) -> Self {
        Self {
            config: Arc::new(config),
            chain: self.chain.clone(),
            prober: Arc::clone(&self.prober),
        }
    }

    /// Processes `host`.
    ///
    /// Resolution failures are logged and produce an empty finding.
    pub async fn work(&self, host: &str) -> Finding {
        let timeout = self.config.timeout;

        let finding = if let Ok(ip) = host.parse::<IpAddr>() {
            if self.prober.probe(ip, timeout).await {
                Finding::live(ip)
            } else {
                Finding::empty()
            }
        } else {
            let ips = match self.chain.resolve(host, &self.config.resolvers).await {
                Ok(ips) => ips,
                Err(e) => {
                    tracing::warn!(host = %host, error = %e, "Failed to resolve domain");
                    return Finding::empty();
                }
            };
            self.first_live(&ips).await
        };

        if self.config.verbose {
            if let Some(endpoint) = finding.endpoint() {
                tracing::info!(host = %host, endpoint = %endpoint, "Found DNS endpoint");
            } else {
                tracing::debug!(host = %host, "No live DNS endpoint");
            }
        }
        finding
    }

    async fn first_live(&self, ips: &[IpAddr]) -> Finding {
        for &ip in ips {
            if self.prober.probe(ip, self.config.timeout).await {
                return Finding::live(ip);
            }
        }
        Finding::empty()
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
