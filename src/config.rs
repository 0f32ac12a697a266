//! Stats client configuration
//!
//! Selects the sink backend, the identifier threshold and the HTTP section.

use crate::bucket::SECTION_REQUEST;
use crate::classifier::DEFAULT_ID_THRESHOLD;
use crate::error::{Result, StatsError};
use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Sink backend selected by DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Keep observations in memory (`memory://`)
    #[default]
    Memory,
    /// Emit observations as tracing events (`log://`)
    Log,
    /// Discard observations (`noop://`)
    Noop,
}

impl Backend {
    /// Parse a DSN such as `memory://` or `log://`.
    ///
    /// Anything after the scheme is ignored by the in-process backends.
    /// Network schemes (`statsd://`, `udp://`) are rejected as unsupported.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let dsn = dsn.trim();
        let (scheme, _rest) = dsn.split_once("://").ok_or_else(|| StatsError::InvalidDsn {
            dsn: dsn.to_string(),
            reason: "expected <scheme>://".to_string(),
        })?;

        match scheme.to_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "log" => Ok(Backend::Log),
            "noop" => Ok(Backend::Noop),
            "" => Err(StatsError::InvalidDsn {
                dsn: dsn.to_string(),
                reason: "empty scheme".to_string(),
            }),
            other => Err(StatsError::UnsupportedBackend {
                scheme: other.to_string(),
            }),
        }
    }

    /// Scheme name without the `://` separator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Log => "log",
            Backend::Noop => "noop",
        }
    }
}

impl FromStr for Backend {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dsn(s)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.as_str())
    }
}

/// Complete stats client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    /// Sink backend
    pub backend: Backend,
    /// Distinct values per prefix before a segment is an identifier
    pub threshold: usize,
    /// Section used for HTTP request buckets
    pub http_request_section: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            threshold: DEFAULT_ID_THRESHOLD,
            http_request_section: SECTION_REQUEST.to_string(),
        }
    }
}

impl StatsConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STATS_DSN`: "memory://", "log://" or "noop://" (default: "memory://")
    /// - `STATS_ID_THRESHOLD`: distinct values per prefix (default: 25)
    /// - `STATS_HTTP_REQUEST_SECTION`: HTTP section name (default: "request")
    ///
    /// # Errors
    ///
    /// Fails on an unknown or unsupported DSN and on a threshold that is not
    /// a positive integer.
    pub fn from_env() -> Result<Self> {
        let backend = match env::var("STATS_DSN") {
            Ok(dsn) if !dsn.trim().is_empty() => Backend::from_dsn(&dsn)?,
            _ => Backend::default(),
        };

        let threshold = match env::var("STATS_ID_THRESHOLD") {
            Ok(value) => parse_threshold(&value)?,
            Err(_) => DEFAULT_ID_THRESHOLD,
        };

        let http_request_section = env::var("STATS_HTTP_REQUEST_SECTION")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SECTION_REQUEST.to_string());

        Ok(Self {
            backend,
            threshold,
            http_request_section,
        })
    }

    /// Create a new configuration builder
    pub fn builder() -> StatsConfigBuilder {
        StatsConfigBuilder::default()
    }
}

/// Builder for StatsConfig
#[derive(Debug, Default)]
pub struct StatsConfigBuilder {
    config: StatsConfig,
}

impl StatsConfigBuilder {
    /// Set the backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the identifier threshold
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the HTTP request section
    pub fn http_request_section(mut self, section: impl Into<String>) -> Self {
        self.config.http_request_section = section.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> StatsConfig {
        self.config
    }
}

fn parse_threshold(value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map(NonZeroUsize::get)
        .map_err(|source| StatsError::InvalidThreshold {
            value: value.to_string(),
            source,
        })
}
