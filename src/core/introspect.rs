//! Read-only views of per-fingerprint state for debugging.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::kv::KvExecutor;
use crate::core::types::{sliding_window_key, token_bucket_key};
use crate::utils::error::Result;

/// One admission in a sliding window log.
#[derive(Debug, Clone, Serialize)]
pub struct SlidingWindowEntry {
    pub request_id: String,
    /// Admission instant, RFC3339.
    pub timestamp: String,
    pub score: f64,
}

/// Read-only access to raw per-fingerprint state.
///
/// Never mutates and never runs an atomic program; observations reflect the
/// last successful transition.
pub struct Introspector {
    executor: Arc<dyn KvExecutor>,
}

impl Introspector {
    pub fn new(executor: Arc<dyn KvExecutor>) -> Self {
        Self { executor }
    }

    /// Raw token bucket hash for a fingerprint; empty when absent.
    pub async fn token_bucket_state(&self, fingerprint: &str) -> Result<HashMap<String, String>> {
        self.executor
            .hash_read_all(&token_bucket_key(fingerprint))
            .await
    }

    /// Sliding window admissions for a fingerprint, ordered by score.
    pub async fn sliding_window_entries(
        &self,
        fingerprint: &str,
    ) -> Result<Vec<SlidingWindowEntry>> {
        let members = self
            .executor
            .sorted_set_range_with_scores(&sliding_window_key(fingerprint))
            .await?;

        Ok(members
            .into_iter()
            .map(|(request_id, score)| SlidingWindowEntry {
                request_id,
                timestamp: chrono::DateTime::from_timestamp(score as i64, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                score,
            })
            .collect())
    }
}
