//! StatsClient - event tracking facade
//!
//! Converts completed requests and operations into one timer observation
//! plus four counter increments (see [`Bucket`] for the key shapes) and
//! forwards them to the configured [`Sink`].
//!
//! # Example
//!
//! ```
//! use stats_buckets::{MemorySink, Operation, StatsClient};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let client = StatsClient::builder().sink(sink.clone()).build();
//!
//! let timer = client.build_timer();
//! client.track_operation("jobs", &Operation::new(["csv", "import"]), timer, true);
//!
//! assert_eq!(sink.count("jobs.csv.import"), 1);
//! assert_eq!(sink.count("total.jobs-ok"), 1);
//! ```

use crate::bucket::{Bucket, Operation, SECTION_REQUEST};
use crate::classifier::IdentifierClassifier;
use crate::config::{Backend, StatsConfig};
use crate::error::Result;
use crate::sink::{LogSink, MemorySink, NoopSink, Sink};
use crate::timer::{SystemTimer, Timer, TimerHandle};
use axum::http::Request;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Tracking facade over a classifier, a sink and a timer.
///
/// Cloning is cheap and clones share all state, including the HTTP section
/// override.
#[derive(Debug, Clone)]
pub struct StatsClient {
    classifier: Arc<IdentifierClassifier>,
    sink: Arc<dyn Sink>,
    timer: Arc<dyn Timer>,
    http_request_section: Arc<RwLock<String>>,
}

impl StatsClient {
    /// Create a new builder.
    pub fn builder() -> StatsClientBuilder {
        StatsClientBuilder::default()
    }

    /// Build a client from configuration, using the monotonic clock.
    pub fn from_config(config: &StatsConfig) -> Self {
        let sink: Arc<dyn Sink> = match config.backend {
            Backend::Memory => Arc::new(MemorySink::new()),
            Backend::Log => Arc::new(LogSink),
            Backend::Noop => Arc::new(NoopSink),
        };

        debug!(
            backend = ?config.backend,
            threshold = config.threshold,
            http_request_section = %config.http_request_section,
            "Stats client created"
        );

        Self::builder()
            .sink(sink)
            .threshold(config.threshold)
            .http_request_section(config.http_request_section.clone())
            .build()
    }

    /// Build a client from `STATS_*` environment variables.
    ///
    /// See [`StatsConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&StatsConfig::from_env()?))
    }

    /// The classifier shared by every HTTP tracking call.
    pub fn classifier(&self) -> &Arc<IdentifierClassifier> {
        &self.classifier
    }

    /// The sink observations are forwarded to.
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Begin timing an event.
    pub fn build_timer(&self) -> TimerHandle {
        self.timer.start()
    }

    /// Track a completed HTTP request.
    ///
    /// The timer observation goes to the base bucket.
    pub fn track_request<B>(&self, request: &Request<B>, timer: TimerHandle, success: bool) {
        self.track_http(request.method().as_str(), request.uri().path(), timer, success);
    }

    /// Track a completed HTTP request given its method and path.
    pub fn track_http(&self, method: &str, path: &str, timer: TimerHandle, success: bool) {
        let section = self.http_request_section();
        let bucket = Bucket::http_request(&section, method, path, success, &self.classifier);

        self.sink.record_time(&bucket.metric(), self.timer.elapsed(&timer));
        self.increment_all(&bucket, 1);
    }

    /// Track one completed operation.
    ///
    /// The timer observation goes to the suffixed bucket.
    pub fn track_operation(
        &self,
        section: &str,
        operation: &Operation,
        timer: TimerHandle,
        success: bool,
    ) {
        self.track_operation_n(section, operation, timer, 1, success);
    }

    /// Track `n` completions of an operation measured by a single timer.
    ///
    /// Emits one timer observation and increments every counter by `n`.
    pub fn track_operation_n(
        &self,
        section: &str,
        operation: &Operation,
        timer: TimerHandle,
        n: u64,
        success: bool,
    ) {
        let bucket = Bucket::plain(section, operation, success);

        self.sink
            .record_time(&bucket.metric_with_suffix(), self.timer.elapsed(&timer));
        self.increment_all(&bucket, n);
    }

    /// Count a hit on an operation without timing it.
    ///
    /// Increments the base and total keys only.
    pub fn track_metric(&self, section: &str, operation: &Operation) {
        let bucket = Bucket::plain(section, operation, true);

        self.sink.increment_count(&bucket.metric(), 1);
        self.sink.increment_count(&bucket.metric_total(), 1);
    }

    /// Current section used for HTTP request buckets.
    pub fn http_request_section(&self) -> String {
        self.http_request_section.read().clone()
    }

    /// Override the section used for HTTP request buckets.
    pub fn set_http_request_section(&self, section: impl Into<String>) {
        *self.http_request_section.write() = section.into();
    }

    /// Restore the default HTTP section (`request`).
    pub fn reset_http_request_section(&self) {
        self.set_http_request_section(SECTION_REQUEST);
    }

    /// Flush the sink. For the in-memory sink this drops everything recorded.
    pub fn close(&self) {
        self.sink.reset();
    }

    fn increment_all(&self, bucket: &Bucket, n: u64) {
        for key in bucket.keys() {
            self.sink.increment_count(&key, n);
        }
    }
}

/// Builder for StatsClient
#[derive(Default)]
pub struct StatsClientBuilder {
    sink: Option<Arc<dyn Sink>>,
    timer: Option<Arc<dyn Timer>>,
    classifier: Option<Arc<IdentifierClassifier>>,
    threshold: Option<usize>,
    http_request_section: Option<String>,
}

impl StatsClientBuilder {
    /// Set the sink (default: [`NoopSink`]).
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the timer (default: [`SystemTimer`]).
    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Share an existing classifier. Takes precedence over `threshold`.
    pub fn classifier(mut self, classifier: Arc<IdentifierClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Threshold for a classifier owned by this client.
    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Initial HTTP request section.
    pub fn http_request_section(mut self, section: impl Into<String>) -> Self {
        self.http_request_section = Some(section.into());
        self
    }

    /// Build the StatsClient.
    pub fn build(self) -> StatsClient {
        let classifier = self.classifier.unwrap_or_else(|| {
            Arc::new(
                self.threshold
                    .map(IdentifierClassifier::new)
                    .unwrap_or_default(),
            )
        });

        StatsClient {
            classifier,
            sink: self.sink.unwrap_or_else(|| Arc::new(NoopSink)),
            timer: self.timer.unwrap_or_else(|| Arc::new(SystemTimer::new())),
            http_request_section: Arc::new(RwLock::new(
                self.http_request_section
                    .unwrap_or_else(|| SECTION_REQUEST.to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;
    use axum::body::Body;
    use std::thread;
    use std::time::Duration;

    fn memory_client() -> (StatsClient, Arc<MemorySink>, Arc<ManualTimer>) {
        let sink = Arc::new(MemorySink::new());
        let timer = Arc::new(ManualTimer::new());
        let client = StatsClient::builder()
            .sink(sink.clone())
            .timer(timer.clone())
            .build();
        (client, sink, timer)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().method("GET").uri(path).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_track_request() {
        let (client, sink, timer) = memory_client();

        let request = get("/hello/memory/test");
        let expected = Bucket::http_request(
            SECTION_REQUEST,
            "GET",
            "/hello/memory/test",
            true,
            &IdentifierClassifier::new(25),
        );

        let handle = client.build_timer();
        timer.advance(Duration::from_millis(42));
        client.track_request(&request, handle, true);

        let times = sink.time_metrics();
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].bucket, expected.metric());
        assert_eq!(times[0].bucket, "request.get.hello.memory.test");
        assert_eq!(times[0].elapsed, Duration::from_millis(42));

        assert_eq!(sink.count_metrics().len(), 4);
        assert_eq!(sink.count("request.get.hello.memory.test"), 1);
        assert_eq!(sink.count("request-ok.get.hello.memory.test"), 1);
        assert_eq!(sink.count("total.request"), 1);
        assert_eq!(sink.count("total.request-ok"), 1);

        client.close();

        assert!(sink.time_metrics().is_empty());
        assert!(sink.count_metrics().is_empty());
    }

    #[test]
    fn test_track_operation() {
        let (client, sink, _) = memory_client();
        let operation = Operation::new(["o1", "o2", "o3"]);
        let bucket = Bucket::plain("test-section", &operation, true);

        client.track_operation("test-section", &operation, client.build_timer(), true);

        let times = sink.time_metrics();
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].bucket, bucket.metric_with_suffix());

        assert_eq!(sink.count_metrics().len(), 4);
        for key in bucket.keys() {
            assert_eq!(sink.count(&key), 1, "{key}");
        }

        client.close();
        assert!(sink.time_metrics().is_empty());
        assert!(sink.count_metrics().is_empty());
    }

    #[test]
    fn test_track_operation_n() {
        let (client, sink, _) = memory_client();
        let operation = Operation::new(["o1", "o2", "o3"]);
        let bucket = Bucket::plain("test-section", &operation, true);

        client.track_operation_n("test-section", &operation, client.build_timer(), 5, true);

        assert_eq!(sink.time_metrics().len(), 1);
        assert_eq!(sink.time_metrics()[0].bucket, bucket.metric_with_suffix());
        assert_eq!(sink.count_metrics().len(), 4);
        for key in bucket.keys() {
            assert_eq!(sink.count(&key), 5, "{key}");
        }
    }

    #[test]
    fn test_track_failure() {
        let (client, sink, _) = memory_client();
        let operation = Operation::new(["db", "write"]);

        client.track_operation("storage", &operation, client.build_timer(), false);

        assert_eq!(sink.count("storage-fail.db.write"), 1);
        assert_eq!(sink.count("total.storage-fail"), 1);
        assert_eq!(sink.count("storage-ok.db.write"), 0);
    }

    #[test]
    fn test_track_metric() {
        let (client, sink, _) = memory_client();
        let operation = Operation::new(["cache", "miss"]);

        client.track_metric("lookup", &operation);
        client.track_metric("lookup", &operation);

        assert!(sink.time_metrics().is_empty());
        assert_eq!(sink.count_metrics().len(), 2);
        assert_eq!(sink.count("lookup.cache.miss"), 2);
        assert_eq!(sink.count("total.lookup"), 2);
    }

    #[test]
    fn test_http_request_section() {
        let (client, sink, _) = memory_client();
        assert_eq!(client.http_request_section(), SECTION_REQUEST);

        client.set_http_request_section("test-section");
        assert_eq!(client.http_request_section(), "test-section");

        client.track_request(&get("/ping"), client.build_timer(), true);
        assert_eq!(sink.count("test-section.get.ping"), 1);
        assert_eq!(sink.count("total.test-section"), 1);

        client.reset_http_request_section();
        assert_eq!(client.http_request_section(), SECTION_REQUEST);
    }

    #[test]
    fn test_ids_collapse_into_one_bucket() {
        let sink = Arc::new(MemorySink::new());
        let client = StatsClient::builder().sink(sink.clone()).threshold(3).build();

        for user in ["alice", "bob", "carol", "dave", "erin"] {
            client.track_request(&get(&format!("/users/{user}")), client.build_timer(), true);
        }

        assert_eq!(sink.count("request.get.users.alice"), 1);
        assert_eq!(sink.count("request.get.users.bob"), 1);
        assert_eq!(sink.count("request.get.users.-id-"), 3);
        assert_eq!(client.classifier().distinct_values("users"), 3);
    }

    #[test]
    fn test_nested_ids_share_timer_buckets() {
        let sink = Arc::new(MemorySink::new());
        let client = StatsClient::builder().sink(sink.clone()).threshold(3).build();

        for i in 0..10 {
            let path = format!("/users/u{i}/posts/p{i}");
            client.track_http("GET", &path, client.build_timer(), true);
        }

        let buckets: std::collections::HashSet<_> =
            sink.time_metrics().into_iter().map(|m| m.bucket).collect();
        assert_eq!(buckets.len(), 5);
        assert_eq!(sink.count("request.get.users.-id-.posts.-id-"), 6);
        assert_eq!(client.classifier().prefix_count(), 8);
    }

    #[test]
    fn test_shared_classifier() {
        let classifier = Arc::new(IdentifierClassifier::new(2));
        let a = StatsClient::builder().classifier(classifier.clone()).build();
        let b = StatsClient::builder()
            .classifier(classifier.clone())
            .threshold(100)
            .build();

        a.track_http("GET", "/items/x", a.build_timer(), true);
        b.track_http("GET", "/items/y", b.build_timer(), true);

        assert_eq!(classifier.distinct_values("items"), 2);
        assert_eq!(b.classifier().threshold(), 2);
    }

    #[test]
    fn test_concurrent_tracking_loses_nothing() {
        let (client, sink, _) = memory_client();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        client.track_http("GET", "/api/health", client.build_timer(), true);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.time_metrics().len(), 2000);
        assert_eq!(sink.count("request.get.api.health"), 2000);
        assert_eq!(sink.count("total.request-ok"), 2000);
    }

    #[test]
    fn test_from_config() {
        let config = StatsConfig::builder()
            .threshold(7)
            .http_request_section("http")
            .build();
        let client = StatsClient::from_config(&config);

        assert_eq!(client.classifier().threshold(), 7);
        assert_eq!(client.http_request_section(), "http");
    }
}
