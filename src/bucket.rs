//! Bucket naming
//!
//! Turns a section, an operation and an outcome into the four metric keys
//! emitted for every tracked event:
//!
//! | Key | Shape | Example |
//! |-----|-------|---------|
//! | base | `section.op` | `request.get.users.-id-` |
//! | base with suffix | `section-ok.op` | `request-ok.get.users.-id-` |
//! | total | `total.section` | `total.request` |
//! | total with suffix | `total.section-ok` | `total.request-ok` |
//!
//! The suffix is `ok` for successful events and `fail` otherwise. The total
//! keys ignore the operation so aggregate dashboards do not depend on
//! endpoint shape.

use crate::classifier::IdentifierClassifier;
use std::fmt;

/// Placeholder rendered for segments classified as identifiers.
pub const ID_PLACEHOLDER: &str = "-id-";

/// Placeholder rendered for empty sections and segments.
pub const EMPTY_PLACEHOLDER: &str = "-";

/// Default section for HTTP request buckets.
pub const SECTION_REQUEST: &str = "request";

const TOTAL_PREFIX: &str = "total";
const SUFFIX_OK: &str = "ok";
const SUFFIX_FAIL: &str = "fail";

/// A single operation segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Rendered as-is (after sanitization)
    Literal(String),
    /// Rendered as [`ID_PLACEHOLDER`]
    Identifier,
}

impl Segment {
    fn render(&self) -> String {
        match self {
            Segment::Literal(value) => sanitize(value),
            Segment::Identifier => ID_PLACEHOLDER.to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Literal(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Literal(value)
    }
}

/// Ordered list of segments describing what was done inside a section.
///
/// ```
/// use stats_buckets::{Operation, Segment};
///
/// let op = Operation::new(["orders", "create"]).with(Segment::Identifier);
/// assert_eq!(op.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Operation {
    segments: Vec<Segment>,
}

impl Operation {
    /// Build an operation from literal segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a segment.
    pub fn with(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.segments.push(segment.into());
    }

    /// The segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the operation has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn render(&self) -> String {
        self.segments
            .iter()
            .map(Segment::render)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl<S: Into<Segment>> FromIterator<S> for Operation {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Operation::new(iter)
    }
}

/// The rendered names of one logical event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    section: String,
    operation: String,
    success: bool,
}

impl Bucket {
    /// Bucket for a named operation.
    pub fn plain(section: &str, operation: &Operation, success: bool) -> Self {
        Self {
            section: sanitize(section),
            operation: operation.render(),
            success,
        }
    }

    /// Bucket for an HTTP request.
    ///
    /// The operation is the lower-cased method followed by every path
    /// segment. Each segment is submitted to `classifier` with the
    /// `/`-joined preceding segments as prefix, identifiers among them
    /// rendered as [`ID_PLACEHOLDER`]; numeric and UUID segments
    /// are identifiers regardless of the classifier verdict.
    pub fn http_request(
        section: &str,
        method: &str,
        path: &str,
        success: bool,
        classifier: &IdentifierClassifier,
    ) -> Self {
        let operation = http_operation(method, path, classifier);
        Self::plain(section, &operation, success)
    }

    /// Outcome the suffixed keys are tagged with.
    pub fn success(&self) -> bool {
        self.success
    }

    /// `section.operation`
    pub fn metric(&self) -> String {
        join_operation(&self.section, &self.operation)
    }

    /// `section-ok.operation` / `section-fail.operation`
    pub fn metric_with_suffix(&self) -> String {
        join_operation(&self.suffixed_section(), &self.operation)
    }

    /// `total.section`
    pub fn metric_total(&self) -> String {
        format!("{TOTAL_PREFIX}.{}", self.section)
    }

    /// `total.section-ok` / `total.section-fail`
    pub fn metric_total_with_suffix(&self) -> String {
        format!("{TOTAL_PREFIX}.{}", self.suffixed_section())
    }

    /// All four keys, in the order base, suffix, total, total with suffix.
    pub fn keys(&self) -> [String; 4] {
        [
            self.metric(),
            self.metric_with_suffix(),
            self.metric_total(),
            self.metric_total_with_suffix(),
        ]
    }

    fn suffixed_section(&self) -> String {
        let suffix = if self.success { SUFFIX_OK } else { SUFFIX_FAIL };
        format!("{}-{suffix}", self.section)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metric())
    }
}

fn join_operation(section: &str, operation: &str) -> String {
    if operation.is_empty() {
        section.to_string()
    } else {
        format!("{section}.{operation}")
    }
}

/// Derive the HTTP operation for `method` and `path`.
///
/// The root path yields a single empty segment, rendered as `-`.
pub fn http_operation(method: &str, path: &str, classifier: &IdentifierClassifier) -> Operation {
    let mut operation = Operation::default();
    operation.push(method.to_lowercase());

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        operation.push("");
        return operation;
    }

    // Collapsed segments enter later prefixes as the placeholder, so IDs
    // nested below other IDs share one prefix.
    let mut rendered: Vec<&str> = Vec::with_capacity(parts.len());
    for part in parts {
        let prefix = rendered.join("/");
        let looks_like_id = classifier.classify(&prefix, part);

        if looks_like_id || is_uuid(part) || is_numeric(part) {
            operation.push(Segment::Identifier);
            rendered.push(ID_PLACEHOLDER);
        } else {
            operation.push(part);
            rendered.push(part);
        }
    }

    operation
}

/// Make a value safe to use as one level of a dotted bucket name.
fn sanitize(value: &str) -> String {
    if value.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    value
        .chars()
        .map(|c| match c {
            '.' | '/' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Check if a string looks like a UUID (8-4-4-4-12 hex pattern).
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }

    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 5 {
        return false;
    }

    let expected_lengths = [8, 4, 4, 4, 12];
    parts
        .iter()
        .zip(expected_lengths.iter())
        .all(|(part, &len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Check if a string is purely numeric.
fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
