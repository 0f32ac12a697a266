//! # stats-buckets
//!
//! Client-side metric naming for counters and timers.
//!
//! Application events (completed HTTP requests, named operations) are turned
//! into hierarchical bucket names and forwarded to a pluggable [`Sink`].
//!
//! ## Features
//!
//! - **Bounded cardinality**: path segments that keep changing (IDs, slugs)
//!   are detected per prefix by the [`IdentifierClassifier`] and collapsed to
//!   `-id-`, with at most `threshold` values remembered per prefix
//! - **Consistent rollups**: every event produces a base key, an outcome
//!   suffixed key and two `total.*` aggregate keys
//! - **Pluggable sinks**: in-memory (tests and inspection), tracing log, no-op
//! - **Axum integration**: [`StatsRouter::with_stats`] tracks every request
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use stats_buckets::{StatsClient, StatsRouter, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     logging::init_tracing(&logging::LoggingConfig::from_env())?;
//!
//!     // STATS_DSN=log:// STATS_ID_THRESHOLD=25
//!     let stats = StatsClient::from_env()?;
//!
//!     let app = Router::new()
//!         .route("/users/:id", get(|| async { "user" }))
//!         .with_stats(stats);
//!
//!     // Serve...
//!     Ok(())
//! }
//! ```

mod bucket;
mod classifier;
mod client;
mod config;
mod error;
pub mod logging;
mod middleware;
mod sink;
mod timer;

// Re-exports
pub use bucket::{
    http_operation, Bucket, Operation, Segment, EMPTY_PLACEHOLDER, ID_PLACEHOLDER,
    SECTION_REQUEST,
};
pub use classifier::{IdentifierClassifier, DEFAULT_ID_THRESHOLD};
pub use client::{StatsClient, StatsClientBuilder};
pub use config::{Backend, StatsConfig, StatsConfigBuilder};
pub use error::{Result, StatsError};
pub use middleware::{stats_middleware, StatsRouter};
pub use sink::{LogSink, MemorySink, NoopSink, Sink, TimeMetric};
pub use timer::{ManualTimer, SystemTimer, Timer, TimerHandle};
