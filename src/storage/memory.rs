//! In-process store executor.
//!
//! Implements the same atomic transitions as the Redis programs over a
//! mutex-guarded map, with expiry driven by the shared clock (purged on
//! access). Used when Redis is disabled, which limits each instance to its
//! own view of the world, and by the test suite, where a manual clock makes
//! refill and expiry timing deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::clock::Clock;
use crate::core::kv::{AtomicProgram, KvExecutor, KvScalar};
use crate::core::types::IDLE_TTL_SECS;
use crate::utils::error::{LimiterError, Result};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: f64,
    expires_at: f64,
}

#[derive(Debug)]
struct Counter {
    count: i64,
    expires_at: f64,
}

#[derive(Debug, Default)]
struct AdmissionLog {
    /// (member, score), kept ordered by score ascending.
    members: Vec<(String, f64)>,
    expires_at: f64,
}

#[derive(Debug, Default)]
struct MemoryStore {
    buckets: HashMap<String, Bucket>,
    counters: HashMap<String, Counter>,
    logs: HashMap<String, AdmissionLog>,
}

impl MemoryStore {
    fn purge(&mut self, now: f64) {
        self.buckets.retain(|_, b| b.expires_at > now);
        self.counters.retain(|_, c| c.expires_at > now);
        self.logs.retain(|_, l| l.expires_at > now);
    }
}

/// Store executor holding all state in process memory.
pub struct MemoryExecutor {
    clock: Arc<dyn Clock>,
    store: Mutex<MemoryStore>,
}

impl MemoryExecutor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            store: Mutex::new(MemoryStore::default()),
        }
    }

    fn token_bucket(
        &self,
        store: &mut MemoryStore,
        key: &str,
        args: &[String],
    ) -> Result<Vec<KvScalar>> {
        let capacity = arg_f64(args, 0, "token bucket")?;
        let refill_rate = arg_f64(args, 1, "token bucket")?;
        let requested = arg_f64(args, 2, "token bucket")?;
        let now = arg_f64(args, 3, "token bucket")?;

        let bucket = store.buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
            expires_at: now + IDLE_TTL_SECS as f64,
        });

        let elapsed = (now - bucket.last_refill).max(0.0);
        bucket.tokens = (bucket.tokens + elapsed * refill_rate).min(capacity);
        bucket.last_refill = now;

        let (allowed, retry_after) = if bucket.tokens >= requested {
            bucket.tokens -= requested;
            (1, 0)
        } else {
            (0, ((requested - bucket.tokens) / refill_rate).ceil() as i64)
        };
        bucket.expires_at = now + IDLE_TTL_SECS as f64;

        Ok(vec![
            KvScalar::Int(allowed),
            KvScalar::Text(bucket.tokens.to_string()),
            KvScalar::Int(retry_after),
        ])
    }

    fn fixed_window(
        &self,
        store: &mut MemoryStore,
        key: &str,
        args: &[String],
    ) -> Result<Vec<KvScalar>> {
        let window = arg_f64(args, 0, "fixed window")?;
        let now = arg_f64(args, 1, "fixed window")?;

        let counter = store.counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + window,
        });
        counter.count += 1;

        Ok(vec![KvScalar::Int(counter.count)])
    }

    fn sliding_window(
        &self,
        store: &mut MemoryStore,
        key: &str,
        args: &[String],
    ) -> Result<Vec<KvScalar>> {
        let window_start = arg_f64(args, 0, "sliding window")?;
        let now = arg_f64(args, 1, "sliding window")?;
        let limit = arg_f64(args, 2, "sliding window")? as i64;
        let request_id = args.get(3).cloned().ok_or_else(|| {
            LimiterError::Protocol("sliding window program argument 3 missing".to_string())
        })?;
        let window = arg_f64(args, 4, "sliding window")?;

        let log = store.logs.entry(key.to_string()).or_default();
        log.members.retain(|(_, score)| *score > window_start);

        let count = log.members.len() as i64;
        if count < limit {
            log.members.push((request_id, now));
            log.members
                .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            log.expires_at = now + IDLE_TTL_SECS as f64;
            return Ok(vec![
                KvScalar::Int(1),
                KvScalar::Int(limit - count - 1),
                KvScalar::Int(0),
            ]);
        }

        let retry_after = log
            .members
            .first()
            .map(|(_, oldest)| (((oldest + window) - now).ceil() as i64).max(1))
            .unwrap_or(1);
        Ok(vec![KvScalar::Int(0), KvScalar::Int(0), KvScalar::Int(retry_after)])
    }
}

fn arg_f64(args: &[String], index: usize, program: &str) -> Result<f64> {
    args.get(index)
        .and_then(|arg| arg.parse::<f64>().ok())
        .ok_or_else(|| {
            LimiterError::Protocol(format!(
                "{} program argument {} missing or malformed",
                program, index
            ))
        })
}

#[async_trait]
impl KvExecutor for MemoryExecutor {
    async fn eval(
        &self,
        program: &AtomicProgram,
        keys: &[String],
        args: &[String],
    ) -> Result<Vec<KvScalar>> {
        let key = keys.first().ok_or_else(|| {
            LimiterError::Protocol(format!("{} program invoked without a key", program.name))
        })?;

        let now = self.clock.now();
        let mut store = self.store.lock().unwrap();
        store.purge(now);

        match program.name {
            "token_bucket" => self.token_bucket(&mut store, key, args),
            "fixed_window" => self.fixed_window(&mut store, key, args),
            "sliding_window" => self.sliding_window(&mut store, key, args),
            other => Err(LimiterError::Protocol(format!(
                "unknown atomic program: {}",
                other
            ))),
        }
    }

    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let now = self.clock.now();
        let mut store = self.store.lock().unwrap();
        store.purge(now);

        Ok(store
            .buckets
            .get(key)
            .map(|bucket| {
                HashMap::from([
                    ("tokens".to_string(), bucket.tokens.to_string()),
                    ("last_refill".to_string(), bucket.last_refill.to_string()),
                ])
            })
            .unwrap_or_default())
    }

    async fn sorted_set_range_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let now = self.clock.now();
        let mut store = self.store.lock().unwrap();
        store.purge(now);

        Ok(store
            .logs
            .get(key)
            .map(|log| log.members.clone())
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn executor(start: f64) -> (Arc<ManualClock>, MemoryExecutor) {
        let clock = Arc::new(ManualClock::new(start));
        let executor = MemoryExecutor::new(clock.clone() as Arc<dyn Clock>);
        (clock, executor)
    }

    const PROGRAM: AtomicProgram = AtomicProgram {
        name: "fixed_window",
        source: "",
    };

    #[tokio::test]
    async fn unknown_program_is_a_protocol_error() {
        let (_, executor) = executor(0.0);
        let bogus = AtomicProgram {
            name: "leaky_bucket",
            source: "",
        };
        let err = executor
            .eval(&bogus, &["k".to_string()], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LimiterError::Protocol(_)));
    }

    #[tokio::test]
    async fn missing_key_is_a_protocol_error() {
        let (_, executor) = executor(0.0);
        let err = executor.eval(&PROGRAM, &[], &[]).await.unwrap_err();
        assert!(matches!(err, LimiterError::Protocol(_)));
    }

    #[tokio::test]
    async fn counter_expires_one_window_after_first_hit() {
        let (clock, executor) = executor(1000.0);
        let keys = vec!["fixed_window:u:960".to_string()];
        let args = vec!["60".to_string(), "1000".to_string()];

        let reply = executor.eval(&PROGRAM, &keys, &args).await.unwrap();
        assert_eq!(reply, vec![KvScalar::Int(1)]);

        // Still within the TTL armed at the first increment.
        clock.set(1059.0);
        let args = vec!["60".to_string(), "1059".to_string()];
        let reply = executor.eval(&PROGRAM, &keys, &args).await.unwrap();
        assert_eq!(reply, vec![KvScalar::Int(2)]);

        // Past the TTL the counter restarts.
        clock.set(1061.0);
        let args = vec!["60".to_string(), "1061".to_string()];
        let reply = executor.eval(&PROGRAM, &keys, &args).await.unwrap();
        assert_eq!(reply, vec![KvScalar::Int(1)]);
    }
}
