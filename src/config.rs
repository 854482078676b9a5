//! Runner configuration.

use crate::error::{Error, Result};
use crate::supply::{BuiltinResolvers, ResolverSupply};
use std::time::Duration;

/// Default number of hosts processed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default liveness probe timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for a single run.
///
/// Built once and then treated as immutable for the lifetime of a
/// [`Runner`](crate::Runner).
///
/// # Example
///
/// ```
/// use dnsgrab::RunnerConfig;
/// use std::time::Duration;
///
/// let config = RunnerConfig::new(vec!["1.1.1.1:53".into()])
///     .with_concurrency(20)
///     .with_delay(Duration::from_millis(50))
///     .with_jitter(Duration::from_millis(25));
///
/// assert_eq!(config.concurrency, 20);
/// assert_eq!(config.resolvers, vec!["1.1.1.1:53"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of hosts in flight at once. Must be at least 1.
    pub concurrency: usize,

    /// Timeout for each liveness probe. Must be non-zero.
    pub timeout: Duration,

    /// Pause before each launch.
    pub delay: Duration,

    /// Upper bound of the random extra pause added to `delay`.
    /// Zero disables jitter.
    pub jitter: Duration,

    /// Resolver addresses (`host:port`), tried in order after the system
    /// resolver fails.
    pub resolvers: Vec<String>,

    /// Report every found endpoint at info level.
    pub verbose: bool,
}

impl RunnerConfig {
    /// Creates a config with default knobs and the given resolver list.
    #[must_use]
    pub const fn new(resolvers: Vec<String>) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
            resolvers,
            verbose: false,
        }
    }

    /// Creates a config whose resolver list is fetched from `supply`.
    ///
    /// A failing supply is not fatal: the error is logged and the config
    /// falls back to an empty list, leaving only the system resolver.
    #[must_use]
    pub fn from_supply(supply: &impl ResolverSupply) -> Self {
        let resolvers = supply.resolvers().unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                "Failed to load resolver list, using system resolver only"
            );
            Vec::new()
        });
        Self::new(resolvers)
    }

    /// Overrides the concurrency limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Overrides the probe timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the launch delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Overrides the jitter bound.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the resolver list.
    #[must_use]
    pub fn with_resolvers(mut self, resolvers: Vec<String>) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Enables or disables verbose reporting.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks that the config can drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `concurrency` or `timeout` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    /// Default knobs with the built-in trusted resolver list.
    fn default() -> Self {
        Self::from_supply(&BuiltinResolvers)
    }
}
