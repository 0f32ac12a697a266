//! Identifier detection for dynamic path segments
//!
//! Bucket names built from raw request paths explode in cardinality as soon
//! as a path carries resource IDs (`/users/1`, `/users/2`, ...). The
//! [`IdentifierClassifier`] watches, per prefix, how many distinct values
//! follow that prefix. Once `threshold` distinct values have been seen, every
//! value at that position is treated as an identifier and collapsed to a
//! placeholder by the bucket namer.
//!
//! # Bounded memory
//!
//! At most `threshold` values are stored per prefix. When the cap is reached
//! the prefix state is frozen: new values are dropped silently and the prefix
//! keeps answering "identifier" for the rest of the process lifetime. This is
//! the intended behavior, not an error, and nothing is reported to callers.
//!
//! The number of prefixes itself is not capped and state is never evicted.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Default number of distinct values after which a segment is an identifier.
pub const DEFAULT_ID_THRESHOLD: usize = 25;

// Large thresholds grow the per-prefix map on demand instead.
const MAX_PREALLOCATED: usize = 64;

/// Per-prefix distinct-value counter with a hard cap on stored values.
///
/// Thread-safe; share it between clients with an `Arc`.
///
/// # Example
///
/// ```
/// use stats_buckets::IdentifierClassifier;
///
/// let classifier = IdentifierClassifier::new(3);
/// assert!(!classifier.classify("users", "1"));
/// assert!(!classifier.classify("users", "2"));
/// assert!(classifier.classify("users", "3"));
/// assert!(classifier.classify("users", "4"));
/// assert_eq!(classifier.distinct_values("users"), 3);
/// ```
#[derive(Debug)]
pub struct IdentifierClassifier {
    threshold: usize,
    prefixes: Mutex<HashMap<String, HashMap<String, u64>>>,
}

impl IdentifierClassifier {
    /// Create a classifier with the given per-prefix cap.
    ///
    /// A threshold of `0` classifies every segment as an identifier.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            prefixes: Mutex::new(HashMap::new()),
        }
    }

    /// The per-prefix cap.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Record `segment` under `prefix` and report whether the position
    /// should now be treated as a dynamic identifier.
    ///
    /// Values are only recorded while the prefix holds fewer than
    /// `threshold` distinct values. Once true for a prefix, the result stays
    /// true forever.
    pub fn classify(&self, prefix: &str, segment: &str) -> bool {
        let mut prefixes = self.prefixes.lock();

        let values = prefixes
            .entry(prefix.to_string())
            .or_insert_with(|| HashMap::with_capacity(self.threshold.min(MAX_PREALLOCATED)));

        if values.len() < self.threshold {
            *values.entry(segment.to_string()).or_insert(0) += 1;

            if values.len() == self.threshold {
                debug!(
                    prefix,
                    threshold = self.threshold,
                    "Prefix reached identifier threshold"
                );
            }
        }

        values.len() >= self.threshold
    }

    /// Number of distinct values stored for `prefix` (never above the cap).
    pub fn distinct_values(&self, prefix: &str) -> usize {
        self.prefixes.lock().get(prefix).map_or(0, HashMap::len)
    }

    /// How many times `segment` was recorded under `prefix`.
    ///
    /// Observations made after the prefix hit the cap are not counted.
    pub fn observations(&self, prefix: &str, segment: &str) -> u64 {
        self.prefixes
            .lock()
            .get(prefix)
            .and_then(|values| values.get(segment).copied())
            .unwrap_or(0)
    }

    /// Number of prefixes seen so far.
    pub fn prefix_count(&self) -> usize {
        self.prefixes.lock().len()
    }
}

impl Default for IdentifierClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ID_THRESHOLD)
    }
}
