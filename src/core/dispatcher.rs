//! Decision dispatcher: validation, defaults, engine selection, fail-open.

use std::sync::Arc;

use tracing::error;

use crate::core::clock::Clock;
use crate::core::fixed_window::FixedWindowEngine;
use crate::core::kv::KvExecutor;
use crate::core::sliding_window::SlidingWindowEngine;
use crate::core::token_bucket::TokenBucketEngine;
use crate::core::types::{Algorithm, DecisionRequest, DecisionResponse, Policy};
use crate::utils::error::Result;

/// Routes each decision to the engine named by its policy.
///
/// All engines share one executor handle, and the dispatcher owns the single
/// clock read of a decision. When the store fails mid-decision the request is
/// admitted with a full-window reset (fail-open): the limiter is a protective
/// overlay, and losing the store must not turn into a request outage.
pub struct Dispatcher {
    token_bucket: TokenBucketEngine,
    fixed_window: FixedWindowEngine,
    sliding_window: SlidingWindowEngine,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn KvExecutor>, clock: Arc<dyn Clock>) -> Self {
        Self {
            token_bucket: TokenBucketEngine::new(Arc::clone(&executor)),
            fixed_window: FixedWindowEngine::new(Arc::clone(&executor)),
            sliding_window: SlidingWindowEngine::new(executor),
            clock,
        }
    }

    /// Decide one request: admit or deny, with pacing bookkeeping.
    ///
    /// Input errors are returned to the caller without touching the store;
    /// store faults are logged and converted into an admit. The store is
    /// never re-invoked on failure, so an ambiguous outcome cannot debit a
    /// fingerprint twice.
    pub async fn decide(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let policy = request.normalize()?;
        let now = self.clock.now();

        let outcome = match policy.algorithm {
            Algorithm::TokenBucket => self.token_bucket.decide(&policy, now).await,
            Algorithm::FixedWindow => self.fixed_window.decide(&policy, now).await,
            Algorithm::SlidingWindow => self.sliding_window.decide(&policy, now).await,
        };

        match outcome {
            Ok(response) => Ok(response),
            Err(err) if err.is_store_fault() => {
                error!(
                    fingerprint = %policy.fingerprint,
                    algorithm = %policy.algorithm,
                    error = %err,
                    "store fault during decision, failing open"
                );
                Ok(fail_open(&policy, now))
            }
            Err(err) => Err(err),
        }
    }
}

/// Admit with a full-window reset when the store cannot answer.
fn fail_open(policy: &Policy, now: f64) -> DecisionResponse {
    DecisionResponse {
        allowed: true,
        remaining: policy.limit - 1,
        reset_time: now as i64 + policy.window,
        retry_after: None,
        algorithm: policy.algorithm,
        tokens: None,
    }
}
