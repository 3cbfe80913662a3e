//! Sliding window decision engine.
//!
//! Admissions are logged as (timestamp, request id) members of a sorted set.
//! At decision time the window is the trailing interval (now − window, now]:
//! members at or before the window start are evicted, the survivors counted,
//! and the request admitted while the count is under the limit. Denials are
//! not logged, so a saturated fingerprint cannot push its own reset further
//! out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::kv::{AtomicProgram, KvExecutor};
use crate::core::types::{sliding_window_key, Algorithm, DecisionResponse, Policy};
use crate::utils::error::{LimiterError, Result};

/// Evict-count-insert transition, executed in one step on the store.
///
/// KEYS[1] = log key; ARGV = window start, now, limit, request id, window.
/// Returns (allowed, remaining, retry seconds). On denial the retry hint is
/// the time until the oldest logged admission leaves the window, floored at
/// one second.
const SLIDING_WINDOW_PROGRAM: AtomicProgram = AtomicProgram {
    name: "sliding_window",
    source: r#"
local key = KEYS[1]
local window_start = tonumber(ARGV[1])
local now = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local request_id = ARGV[4]
local window = tonumber(ARGV[5])

redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)

local count = redis.call('ZCARD', key)
if count < limit then
    redis.call('ZADD', key, now, request_id)
    redis.call('EXPIRE', key, 3600)
    return {1, limit - count - 1, 0}
end

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local retry_after = 1
if #oldest > 0 then
    retry_after = math.ceil(tonumber(oldest[2]) + window - now)
    if retry_after < 1 then
        retry_after = 1
    end
end
return {0, 0, retry_after}
"#,
};

/// Source of member ids for the admission log.
///
/// Ids combine the nanosecond wall clock with a process-local sequence, so
/// concurrent decisions in one instance can never collide on a member key;
/// colliding with another instance additionally requires an identical
/// nanosecond reading.
#[derive(Debug, Default)]
pub struct RequestIdSource {
    sequence: AtomicU64,
}

impl RequestIdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique member id.
    pub fn next_id(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", nanos, sequence)
    }
}

/// Sliding window engine: one atomic program, an id source, and a response
/// adapter.
pub struct SlidingWindowEngine {
    executor: Arc<dyn KvExecutor>,
    ids: RequestIdSource,
}

impl SlidingWindowEngine {
    pub fn new(executor: Arc<dyn KvExecutor>) -> Self {
        Self {
            executor,
            ids: RequestIdSource::new(),
        }
    }

    /// Run one decision at wall-clock `now` (fractional epoch seconds).
    ///
    /// Scores are whole epoch seconds, matching the persisted layout.
    pub async fn decide(&self, policy: &Policy, now: f64) -> Result<DecisionResponse> {
        let now_secs = now as i64;
        let window_start = now_secs - policy.window;
        let keys = vec![sliding_window_key(&policy.fingerprint)];
        let args = vec![
            window_start.to_string(),
            now_secs.to_string(),
            policy.limit.to_string(),
            self.ids.next_id(),
            policy.window.to_string(),
        ];

        let reply = self
            .executor
            .eval(&SLIDING_WINDOW_PROGRAM, &keys, &args)
            .await?;
        if reply.len() != 3 {
            return Err(LimiterError::Protocol(format!(
                "sliding window program returned {} values, expected 3",
                reply.len()
            )));
        }

        let allowed = reply[0].as_i64()? == 1;
        let remaining = reply[1].as_i64()?;
        let retry_after = reply[2].as_i64()?;

        Ok(DecisionResponse {
            allowed,
            remaining: remaining.max(0),
            reset_time: now_secs + policy.window,
            retry_after: (retry_after > 0).then_some(retry_after),
            algorithm: Algorithm::SlidingWindow,
            tokens: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn request_ids_are_unique_under_contention() {
        let source = Arc::new(RequestIdSource::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let source = Arc::clone(&source);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| source.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate request id generated");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
