//! Store executor seam shared by every decision engine.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::utils::error::{LimiterError, Result};

/// A named server-side program executed indivisibly by the store.
///
/// The source is Lua, compiled once per process; the name lets non-Lua
/// backends dispatch to a native implementation of the same transition.
#[derive(Debug, Clone, Copy)]
pub struct AtomicProgram {
    /// Stable identifier of the transition.
    pub name: &'static str,
    /// Lua source submitted to the store.
    pub source: &'static str,
}

/// One scalar in an atomic program's reply tuple.
///
/// Store replies are self-describing; the accessors normalize into native
/// values, parsing decimal strings where the store cannot carry a real
/// without truncation.
#[derive(Debug, Clone, PartialEq)]
pub enum KvScalar {
    Int(i64),
    Real(f64),
    Text(String),
}

impl KvScalar {
    /// Integer reading of the scalar.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            KvScalar::Int(v) => Ok(*v),
            KvScalar::Real(v) => Ok(*v as i64),
            KvScalar::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                LimiterError::Protocol(format!("expected integer scalar, got {:?}", s))
            }),
        }
    }

    /// Real-number reading of the scalar.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            KvScalar::Int(v) => Ok(*v as f64),
            KvScalar::Real(v) => Ok(*v),
            KvScalar::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                LimiterError::Protocol(format!("expected real scalar, got {:?}", s))
            }),
        }
    }
}

/// Interface to the shared KV store.
///
/// Every per-fingerprint state transition flows through `eval`; the remaining
/// operations are read-only debugging and liveness hooks. Implementations
/// must be safe for concurrent use, since all engines share one handle.
#[async_trait]
pub trait KvExecutor: Send + Sync {
    /// Execute an atomic program against `keys` with string `args` and
    /// return its reply tuple.
    async fn eval(
        &self,
        program: &AtomicProgram,
        keys: &[String],
        args: &[String],
    ) -> Result<Vec<KvScalar>>;

    /// Read every field of a hash key. Missing keys yield an empty map.
    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Read the full contents of a sorted set with scores, ascending.
    async fn sorted_set_range_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>>;

    /// Liveness probe against the store.
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_integer_readings() {
        assert_eq!(KvScalar::Int(7).as_i64().unwrap(), 7);
        assert_eq!(KvScalar::Real(7.9).as_i64().unwrap(), 7);
        assert_eq!(KvScalar::Text("42".to_string()).as_i64().unwrap(), 42);
        assert!(KvScalar::Text("seven".to_string()).as_i64().is_err());
    }

    #[test]
    fn scalar_real_readings() {
        assert_eq!(KvScalar::Int(3).as_f64().unwrap(), 3.0);
        assert_eq!(KvScalar::Real(2.5).as_f64().unwrap(), 2.5);
        assert_eq!(KvScalar::Text("9.25".to_string()).as_f64().unwrap(), 9.25);
        assert!(KvScalar::Text("".to_string()).as_f64().is_err());
    }
}
