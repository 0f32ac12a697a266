//! Error types for stats-buckets
//!
//! Tracking itself never fails. Only configuration and logging bootstrap
//! can produce errors.

use std::num::ParseIntError;
use thiserror::Error;

/// Result type alias for fallible stats-buckets operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Configuration and bootstrap errors
#[derive(Error, Debug)]
pub enum StatsError {
    /// Backend scheme is known but not provided by this crate
    #[error("Unsupported stats backend: {scheme}. Valid options: memory, log, noop")]
    UnsupportedBackend { scheme: String },

    /// DSN could not be parsed at all
    #[error("Invalid stats DSN {dsn:?}: {reason}")]
    InvalidDsn { dsn: String, reason: String },

    /// Identifier threshold is not a positive integer
    #[error("Invalid identifier threshold {value:?}: {source}")]
    InvalidThreshold {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StatsError::UnsupportedBackend {
            scheme: "statsd".to_string(),
        };
        assert!(err.to_string().contains("statsd"));

        let err = StatsError::InvalidDsn {
            dsn: "memory".to_string(),
            reason: "missing scheme separator".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid stats DSN \"memory\": missing scheme separator"
        );
    }

    #[test]
    fn test_threshold_error_has_source() {
        use std::error::Error as _;

        let source = "abc".parse::<usize>().unwrap_err();
        let err = StatsError::InvalidThreshold {
            value: "abc".to_string(),
            source,
        };
        assert!(err.source().is_some());
    }
}
