//! Storage configuration

use serde::{Deserialize, Serialize};

use super::default_connection_timeout;

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Enable Redis (if false, use the in-process store)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,
    /// Per-request deadline in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            enabled: default_redis_enabled(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl RedisConfig {
    /// Validate Redis settings
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled {
            let parsed = url::Url::parse(&self.url)
                .map_err(|e| format!("invalid Redis URL: {}", e))?;
            if !matches!(parsed.scheme(), "redis" | "rediss") {
                return Err(format!("unsupported Redis URL scheme: {}", parsed.scheme()));
            }
        }
        if self.connection_timeout == 0 {
            return Err("connection_timeout must be non-zero".to_string());
        }
        Ok(())
    }

    /// Merge Redis configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != default_redis_url() {
            self.url = other.url;
        }
        if other.enabled != default_redis_enabled() {
            self.enabled = other.enabled;
        }
        if other.connection_timeout != default_connection_timeout() {
            self.connection_timeout = other.connection_timeout;
        }
        self
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_enabled() -> bool {
    true
}
