//! Token bucket decision engine.
//!
//! The bucket holds up to `limit` tokens and refills continuously at
//! `limit / window` tokens per second. A request costing `cost` tokens is
//! admitted iff the refilled bucket holds at least `cost`; admission debits
//! the bucket. Unused budget accumulates up to the capacity, so short bursts
//! are absorbed while the long-run rate stays at the refill rate.

use std::sync::Arc;

use crate::core::kv::{AtomicProgram, KvExecutor};
use crate::core::types::{token_bucket_key, Algorithm, DecisionResponse, Policy};
use crate::utils::error::{LimiterError, Result};

/// Refill-and-debit transition, executed in one step on the store.
///
/// KEYS[1] = bucket key; ARGV = capacity, refill rate, requested tokens, now.
/// Returns (allowed, post-decision tokens as a decimal string, retry seconds).
/// The token count crosses the reply boundary as a string because the store
/// truncates reply numbers to integers.
const TOKEN_BUCKET_PROGRAM: AtomicProgram = AtomicProgram {
    name: "token_bucket",
    source: r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local refill_rate = tonumber(ARGV[2])
local requested = tonumber(ARGV[3])
local now = tonumber(ARGV[4])

local bucket = redis.call('HMGET', key, 'tokens', 'last_refill')
local tokens = tonumber(bucket[1])
local last_refill = tonumber(bucket[2])

if tokens == nil then
    tokens = capacity
    last_refill = now
end

-- Clamp so a caller clock behind the stored stamp never refills negatively.
local elapsed = math.max(0, now - last_refill)
tokens = math.min(capacity, tokens + elapsed * refill_rate)

local allowed = 0
local retry_after = 0
if tokens >= requested then
    tokens = tokens - requested
    allowed = 1
else
    retry_after = math.ceil((requested - tokens) / refill_rate)
end

redis.call('HSET', key, 'tokens', tokens, 'last_refill', now)
redis.call('EXPIRE', key, 3600)

return {allowed, tostring(tokens), retry_after}
"#,
};

/// Token bucket engine: one atomic program plus a response adapter.
pub struct TokenBucketEngine {
    executor: Arc<dyn KvExecutor>,
}

impl TokenBucketEngine {
    pub fn new(executor: Arc<dyn KvExecutor>) -> Self {
        Self { executor }
    }

    /// Run one decision at wall-clock `now` (fractional epoch seconds).
    ///
    /// `remaining` is the integer floor of the post-decision token count;
    /// `reset_time` is the end of the policy window, not the instant the
    /// bucket refills completely.
    pub async fn decide(&self, policy: &Policy, now: f64) -> Result<DecisionResponse> {
        let keys = vec![token_bucket_key(&policy.fingerprint)];
        let args = vec![
            policy.limit.to_string(),
            policy.refill_rate().to_string(),
            policy.cost.to_string(),
            format!("{:.6}", now),
        ];

        let reply = self
            .executor
            .eval(&TOKEN_BUCKET_PROGRAM, &keys, &args)
            .await?;
        if reply.len() != 3 {
            return Err(LimiterError::Protocol(format!(
                "token bucket program returned {} values, expected 3",
                reply.len()
            )));
        }

        let allowed = reply[0].as_i64()? == 1;
        let tokens = reply[1].as_f64()?;
        let retry_after = reply[2].as_i64()?;

        Ok(DecisionResponse {
            allowed,
            remaining: tokens.floor() as i64,
            reset_time: now as i64 + policy.window,
            retry_after: (retry_after > 0).then_some(retry_after),
            algorithm: Algorithm::TokenBucket,
            tokens: Some(tokens),
        })
    }
}
