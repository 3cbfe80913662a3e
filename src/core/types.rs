//! Decision request/response types and persisted key formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::{LimiterError, Result};

/// Idle expiry in seconds applied to token bucket and sliding window state.
/// Fixed window counters expire with their window instead.
pub const IDLE_TTL_SECS: i64 = 3600;

/// Rate limiting algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    TokenBucket,
    FixedWindow,
    SlidingWindow,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::TokenBucket
    }
}

impl FromStr for Algorithm {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "token_bucket" => Ok(Algorithm::TokenBucket),
            "fixed_window" => Ok(Algorithm::FixedWindow),
            "sliding_window" => Ok(Algorithm::SlidingWindow),
            other => Err(LimiterError::Validation(format!(
                "unsupported algorithm: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::TokenBucket => "token_bucket",
            Algorithm::FixedWindow => "fixed_window",
            Algorithm::SlidingWindow => "sliding_window",
        };
        f.write_str(name)
    }
}

/// A rate limit decision request as received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Fingerprint partitioning the rate limit state (user id, API key, ...).
    #[serde(rename = "key")]
    pub fingerprint: String,
    /// Requests per window, or bucket capacity.
    pub limit: i64,
    /// Window length in seconds.
    pub window: i64,
    /// Algorithm name; the token bucket when absent.
    pub algorithm: Option<String>,
    /// Tokens consumed by this decision (token bucket only).
    #[serde(rename = "tokens")]
    pub cost: Option<i64>,
}

impl DecisionRequest {
    /// Build a request with the default algorithm and cost.
    pub fn new(fingerprint: impl Into<String>, limit: i64, window: i64) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            limit,
            window,
            algorithm: None,
            cost: None,
        }
    }

    /// Select an algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm.to_string());
        self
    }

    /// Set the token cost of the decision.
    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Validate the request and apply defaults, yielding the policy the
    /// engines run against.
    pub fn normalize(&self) -> Result<Policy> {
        if self.fingerprint.trim().is_empty() {
            return Err(LimiterError::Validation(
                "key must not be empty".to_string(),
            ));
        }
        if self.limit <= 0 {
            return Err(LimiterError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        if self.window <= 0 {
            return Err(LimiterError::Validation(
                "window must be a positive integer".to_string(),
            ));
        }

        let algorithm = match self.algorithm.as_deref() {
            None | Some("") => Algorithm::default(),
            Some(name) => name.parse()?,
        };

        let cost = self.cost.unwrap_or(1);
        if cost <= 0 {
            return Err(LimiterError::Validation(
                "tokens must be a positive integer".to_string(),
            ));
        }

        Ok(Policy {
            fingerprint: self.fingerprint.clone(),
            limit: self.limit,
            window: self.window,
            cost,
            algorithm,
        })
    }
}

/// A validated, defaulted decision request.
#[derive(Debug, Clone)]
pub struct Policy {
    pub fingerprint: String,
    pub limit: i64,
    pub window: i64,
    pub cost: i64,
    pub algorithm: Algorithm,
}

impl Policy {
    /// Token bucket refill rate in tokens per second.
    pub fn refill_rate(&self) -> f64 {
        self.limit as f64 / self.window as f64
    }
}

/// The outcome of a rate limit decision.
///
/// `retry_after` and `tokens` follow the wire convention of the service:
/// absent unless they carry information (a denial hint, the token bucket's
/// post-decision balance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    /// Whether the request was admitted.
    pub allowed: bool,
    /// Remaining budget after this decision.
    pub remaining: i64,
    /// Epoch seconds when the policy window rolls over.
    pub reset_time: i64,
    /// Seconds to wait before retrying a denied request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
    /// Algorithm that produced the decision.
    pub algorithm: Algorithm,
    /// Post-decision token balance (token bucket only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<f64>,
}

/// Key of the token bucket hash for a fingerprint.
pub fn token_bucket_key(fingerprint: &str) -> String {
    format!("token_bucket:{}", fingerprint)
}

/// Key of the fixed window counter for a fingerprint and aligned window start.
pub fn fixed_window_key(fingerprint: &str, window_start: i64) -> String {
    format!("fixed_window:{}:{}", fingerprint, window_start)
}

/// Key of the sliding window log for a fingerprint.
pub fn sliding_window_key(fingerprint: &str) -> String {
    format!("sliding_window:{}", fingerprint)
}
