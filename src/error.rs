//! Error types.

use thiserror::Error;

/// Result alias for dnsgrab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by dnsgrab operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failed (reading a resolver list, dialing, or a backend lookup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the system resolver nor any configured resolver could
    /// resolve the host.
    #[error("failed to resolve IP address for domain {host}: {source}")]
    Resolution {
        /// The hostname that could not be resolved.
        host: String,
        /// The last underlying error encountered.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns `true` if this is a resolution failure.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    /// Returns `true` if the underlying I/O error is `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_message_names_host() {
        let err = Error::Resolution {
            host: "example.invalid".into(),
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "dial timed out"),
        };
        assert!(err.is_resolution());
        let msg = err.to_string();
        assert!(msg.contains("example.invalid"));
        assert!(msg.contains("dial timed out"));
    }

    #[test]
    fn io_not_found() {
        let err = Error::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert!(!err.is_resolution());
    }
}
