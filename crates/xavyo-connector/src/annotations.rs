//! Side-channel annotations attached to connector outcomes.
//!
//! A backend call may report rate-limit information whether it succeeded or
//! failed. Annotations carry that information to the host orchestrator next to
//! the outcome instead of replacing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Rate-limit state reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStatus {
    /// The backend did not say.
    #[default]
    Unspecified,
    /// Quota remains.
    Ok,
    /// Quota exhausted; the caller should back off until `reset_at`.
    Overlimit,
}

/// Rate-limit signal attached to a backend call outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RateLimitDescription {
    /// Reported state.
    #[serde(default)]
    pub status: RateLimitStatus,
    /// Requests allowed in the current window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Requests remaining in the current window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    /// When the window resets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitDescription {
    /// Create a description with only a request limit.
    #[must_use]
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Create a description for an exhausted quota.
    #[must_use]
    pub fn overlimit(reset_at: Option<DateTime<Utc>>) -> Self {
        Self {
            status: RateLimitStatus::Overlimit,
            remaining: Some(0),
            reset_at,
            ..Default::default()
        }
    }

    /// Whether the backend reported an exhausted quota.
    #[must_use]
    pub fn is_overlimit(&self) -> bool {
        self.status == RateLimitStatus::Overlimit
    }
}

/// A single annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Rate-limit signal from the backend.
    RateLimit(RateLimitDescription),
}

/// Ordered set of annotations returned alongside an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    /// Create an empty annotation set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a rate-limit signal.
    pub fn with_rate_limiting(&mut self, description: RateLimitDescription) {
        self.0.push(Annotation::RateLimit(description));
    }

    /// Attach a rate-limit signal if one was reported.
    pub fn maybe_rate_limiting(&mut self, description: Option<RateLimitDescription>) {
        if let Some(description) = description {
            self.with_rate_limiting(description);
        }
    }

    /// The most recent rate-limit signal, if any.
    #[must_use]
    pub fn rate_limit(&self) -> Option<&RateLimitDescription> {
        self.0.iter().rev().find_map(|a| match a {
            Annotation::RateLimit(rl) => Some(rl),
        })
    }

    /// Whether any rate-limit signal is attached.
    #[must_use]
    pub fn has_rate_limit(&self) -> bool {
        self.rate_limit().is_some()
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }
}

/// Outcome of a connector operation plus the annotations gathered while
/// producing it.
///
/// `annotations` is filled in independently of `result`: a failed call still
/// reports any rate-limit signal the backend returned.
#[derive(Debug)]
#[must_use]
pub struct Annotated<T> {
    /// The operation outcome. On failure no partial value is exposed.
    pub result: ConnectorResult<T>,
    /// Side-channel annotations.
    pub annotations: Annotations,
}

impl<T> Annotated<T> {
    /// Pair a result with its annotations.
    pub fn new(result: ConnectorResult<T>, annotations: Annotations) -> Self {
        Self {
            result,
            annotations,
        }
    }

    /// A successful outcome with no annotations.
    pub fn ok(value: T) -> Self {
        Self::new(Ok(value), Annotations::new())
    }

    /// A failed outcome with no annotations (validation failures).
    pub fn err(error: ConnectorError) -> Self {
        Self::new(Err(error), Annotations::new())
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether the operation failed.
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Transform the successful value, keeping annotations.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Annotated<U> {
        Annotated {
            result: self.result.map(f),
            annotations: self.annotations,
        }
    }

    /// Split into the result and the annotations.
    pub fn into_parts(self) -> (ConnectorResult<T>, Annotations) {
        (self.result, self.annotations)
    }
}
