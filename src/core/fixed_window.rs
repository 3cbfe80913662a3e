//! Fixed window decision engine.
//!
//! Time is partitioned into aligned windows of `window` seconds starting at
//! epoch 0. Each (fingerprint, window start) pair owns an independent counter
//! that rolls off with the window's TTL. Adjacent windows are independent, so
//! a burst straddling a boundary can reach twice the nominal rate; callers
//! needing a smooth bound should use the sliding window algorithm.

use std::sync::Arc;

use crate::core::kv::{AtomicProgram, KvExecutor};
use crate::core::types::{fixed_window_key, Algorithm, DecisionResponse, Policy};
use crate::utils::error::{LimiterError, Result};

/// Counter bump executed in one step: increment, arm the window TTL on the
/// first hit, and hand the count back for the admit comparison. Denied
/// attempts leave their increment in place; the counter expires with the
/// window either way.
///
/// KEYS[1] = counter key; ARGV[1] = window seconds.
const FIXED_WINDOW_PROGRAM: AtomicProgram = AtomicProgram {
    name: "fixed_window",
    source: r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
end
return {count}
"#,
};

/// Fixed window engine: one atomic program plus a response adapter.
pub struct FixedWindowEngine {
    executor: Arc<dyn KvExecutor>,
}

impl FixedWindowEngine {
    pub fn new(executor: Arc<dyn KvExecutor>) -> Self {
        Self { executor }
    }

    /// Run one decision at wall-clock `now` (fractional epoch seconds).
    ///
    /// Admits iff the post-increment count is within the limit. Denials carry
    /// no retry hint; callers wait for `reset_time`.
    pub async fn decide(&self, policy: &Policy, now: f64) -> Result<DecisionResponse> {
        let window_start = (now / policy.window as f64).floor() as i64 * policy.window;
        let keys = vec![fixed_window_key(&policy.fingerprint, window_start)];
        let args = vec![policy.window.to_string(), format!("{:.6}", now)];

        let reply = self
            .executor
            .eval(&FIXED_WINDOW_PROGRAM, &keys, &args)
            .await?;
        let count = reply
            .first()
            .ok_or_else(|| {
                LimiterError::Protocol("fixed window program returned no count".to_string())
            })?
            .as_i64()?;

        Ok(DecisionResponse {
            allowed: count <= policy.limit,
            remaining: (policy.limit - count).max(0),
            reset_time: window_start + policy.window,
            retry_after: None,
            algorithm: Algorithm::FixedWindow,
            tokens: None,
        })
    }
}
