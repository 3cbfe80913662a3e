//! Configuration management
//!
//! This module handles loading, validation, and merging of service
//! configuration.

pub mod models;

pub use models::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::utils::error::{LimiterError, Result};

/// Main configuration struct for the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LimiterError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| LimiterError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Apply environment overrides: `PORT`, `HOST`, `REDIS_URL`,
    /// `REDIS_ENABLED`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| LimiterError::Config(format!("Invalid PORT value: {}", port)))?;
        }
        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.is_empty() {
                self.redis.url = url;
            }
        }
        if let Ok(enabled) = std::env::var("REDIS_ENABLED") {
            self.redis.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.server
            .validate()
            .map_err(|e| LimiterError::Config(format!("Server config error: {}", e)))?;

        self.redis
            .validate()
            .map_err(|e| LimiterError::Config(format!("Redis config error: {}", e)))?;

        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.redis = self.redis.merge(other.redis);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "127.0.0.1"
  port: 9090
  workers: 4

redis:
  url: "redis://cache.internal:6379"
  connection_timeout: 2
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.workers, Some(4));
        assert_eq!(config.redis.url, "redis://cache.internal:6379");
        assert_eq!(config.redis.connection_timeout, 2);
    }

    #[tokio::test]
    async fn test_config_rejects_bad_redis_url() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"redis:\n  url: \"http://not-redis\"\n")
            .unwrap();

        let err = Config::from_file(temp_file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Redis config error"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert!(config.redis.enabled);
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let mut overrides = Config::default();
        overrides.server.port = 9999;
        overrides.redis.enabled = false;

        let merged = Config::default().merge(overrides);
        assert_eq!(merged.server.port, 9999);
        assert!(!merged.redis.enabled);
        assert_eq!(merged.server.host, "0.0.0.0");
    }

    #[test]
    fn test_env_override_port() {
        std::env::set_var("PORT", "8181");
        let config = Config::default().with_env_overrides().unwrap();
        std::env::remove_var("PORT");

        assert_eq!(config.server.port, 8181);
    }
}
