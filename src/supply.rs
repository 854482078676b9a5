//! Resolver list providers.
//!
//! A [`ResolverSupply`] hands the runner its ordered list of fallback
//! resolver addresses. The list is fetched once, when a
//! [`RunnerConfig`](crate::RunnerConfig) is built.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Port appended to resolver entries that do not carry one.
const DNS_PORT: u16 = 53;

/// Well-known public resolvers, in preference order.
const TRUSTED_RESOLVERS: &[&str] = &[
    "1.1.1.1:53",
    "1.0.0.1:53",
    "8.8.8.8:53",
    "8.8.4.4:53",
    "9.9.9.9:53",
    "149.112.112.112:53",
    "208.67.222.222:53",
    "208.67.220.220:53",
];

/// Source of resolver addresses (`host:port`).
pub trait ResolverSupply {
    /// Returns resolver addresses in the order they should be tried.
    ///
    /// # Errors
    ///
    /// Implementation specific; callers treat any error as "no resolvers".
    fn resolvers(&self) -> Result<Vec<String>>;
}

/// The built-in list of trusted public resolvers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolvers;

impl ResolverSupply for BuiltinResolvers {
    fn resolvers(&self) -> Result<Vec<String>> {
        Ok(TRUSTED_RESOLVERS.iter().map(ToString::to_string).collect())
    }
}

/// Reads resolvers from a newline-separated file.
///
/// Blank lines and lines starting with `#` are skipped. Entries without a
/// port get `:53`.
///
/// ```text
/// # corporate resolvers
/// 10.0.0.2
/// 10.0.0.3:5353
/// [2606:4700:4700::1111]:53
/// ```
#[derive(Debug, Clone)]
pub struct FileResolvers {
    path: PathBuf,
}

impl FileResolvers {
    /// Creates a supply reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResolverSupply for FileResolvers {
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read.
    fn resolvers(&self) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        let resolvers: Vec<String> = parse_resolver_lines(&content);
        tracing::debug!(
            path = %self.path.display(),
            count = resolvers.len(),
            "Loaded resolver list"
        );
        Ok(resolvers)
    }
}

fn parse_resolver_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(with_default_port)
        .collect()
}

/// Appends `:53` unless the entry already names a port.
fn with_default_port(entry: &str) -> String {
    if entry.parse::<std::net::SocketAddr>().is_ok() {
        return entry.to_string();
    }
    if let Ok(ip) = entry.parse::<std::net::IpAddr>() {
        return std::net::SocketAddr::new(ip, DNS_PORT).to_string();
    }
    match entry.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => entry.to_string(),
        _ => format!("{entry}:{DNS_PORT}"),
    }
}
