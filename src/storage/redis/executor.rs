//! Store executor backed by Redis.
//!
//! Atomic programs run as Lua scripts (EVALSHA with automatic loading).
//! Every round-trip is bounded by the configured deadline; an expired
//! deadline surfaces as a timeout fault, which admits the caller downstream.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, Script, Value};

use crate::core::kv::{AtomicProgram, KvExecutor, KvScalar};
use crate::storage::redis::pool::RedisPool;
use crate::utils::error::{LimiterError, Result};

#[async_trait]
impl KvExecutor for RedisPool {
    async fn eval(
        &self,
        program: &AtomicProgram,
        keys: &[String],
        args: &[String],
    ) -> Result<Vec<KvScalar>> {
        let script = Script::new(program.source);
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(key.as_str());
        }
        for arg in args {
            invocation.arg(arg.as_str());
        }

        let mut conn = self.connection();
        let reply: Value =
            tokio::time::timeout(self.request_timeout, invocation.invoke_async(&mut conn))
                .await
                .map_err(|_| {
                    LimiterError::Timeout(format!("atomic program {} timed out", program.name))
                })?
                .map_err(LimiterError::Redis)?;

        scalars_from_value(reply, program.name)
    }

    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.connection();
        let map: HashMap<String, String> =
            tokio::time::timeout(self.request_timeout, conn.hgetall(key))
                .await
                .map_err(|_| LimiterError::Timeout(format!("HGETALL {} timed out", key)))?
                .map_err(LimiterError::Redis)?;
        Ok(map)
    }

    async fn sorted_set_range_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let mut conn = self.connection();
        let members: Vec<(String, f64)> =
            tokio::time::timeout(self.request_timeout, conn.zrange_withscores(key, 0, -1))
                .await
                .map_err(|_| LimiterError::Timeout(format!("ZRANGE {} timed out", key)))?
                .map_err(LimiterError::Redis)?;
        Ok(members)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection();
        let _: String = tokio::time::timeout(
            self.request_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| LimiterError::Timeout("PING timed out".to_string()))?
        .map_err(LimiterError::Redis)?;
        Ok(())
    }
}

/// Normalize an atomic program reply into a scalar tuple.
fn scalars_from_value(value: Value, program: &str) -> Result<Vec<KvScalar>> {
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    items
        .into_iter()
        .map(|item| scalar_from_value(item, program))
        .collect()
}

fn scalar_from_value(value: Value, program: &str) -> Result<KvScalar> {
    match value {
        Value::Int(v) => Ok(KvScalar::Int(v)),
        Value::Double(v) => Ok(KvScalar::Real(v)),
        Value::BulkString(bytes) => String::from_utf8(bytes).map(KvScalar::Text).map_err(|_| {
            LimiterError::Protocol(format!("{} program returned non-UTF-8 text", program))
        }),
        Value::SimpleString(s) => Ok(KvScalar::Text(s)),
        other => Err(LimiterError::Protocol(format!(
            "{} program returned unsupported value: {:?}",
            program, other
        ))),
    }
}
