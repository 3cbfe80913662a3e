//! Redis connection pool and core connection management.

use std::time::Duration;

use redis::{aio::MultiplexedConnection, Client};
use tracing::{debug, info};

use crate::config::RedisConfig;
use crate::utils::error::Result;

/// Redis connection pool built on one multiplexed async connection.
///
/// Clones share the underlying connection; the redis driver serializes
/// in-flight commands over it.
#[derive(Clone)]
pub struct RedisPool {
    connection: MultiplexedConnection,
    /// Deadline applied to every store round-trip.
    pub(crate) request_timeout: Duration,
}

impl RedisPool {
    /// Connect and verify the store answers a ping.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        info!("Connecting to Redis at {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str())?;
        let mut connection = client.get_multiplexed_async_connection().await?;

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        info!("Redis connection established");

        Ok(Self {
            connection,
            request_timeout: Duration::from_secs(config.connection_timeout),
        })
    }

    /// Handle to the shared connection.
    pub(crate) fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Sanitize a Redis URL for logging (hide password).
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            debug!("Redis URL failed to parse for sanitizing");
            "invalid_url".to_string()
        }
    }
}
