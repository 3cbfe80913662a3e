//! HTTP server implementation
//!
//! The transport shell around the decision core: routing, health and metrics
//! probes, and graceful shutdown.

pub mod routes;


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer as ActixHttpServer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::core::clock::SystemClock;
use crate::core::dispatcher::Dispatcher;
use crate::core::introspect::Introspector;
use crate::core::kv::KvExecutor;
use crate::storage::{MemoryExecutor, RedisPool};
use crate::utils::error::{LimiterError, Result};

/// Default configuration file path.
const CONFIG_PATH: &str = "config/limiter.yaml";

/// Decision counters surfaced by the metrics endpoint.
#[derive(Debug, Default)]
pub struct DecisionMetrics {
    /// Admitted decisions
    pub allowed: AtomicU64,
    /// Denied decisions
    pub denied: AtomicU64,
    /// Requests rejected as malformed
    pub rejected: AtomicU64,
}

impl DecisionMetrics {
    /// Count one completed decision.
    pub fn record(&self, allowed: bool) {
        if allowed {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count one rejected request.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }
}

/// HTTP server state shared across handlers
///
/// All fields are wrapped in Arc for efficient sharing across worker threads.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Decision dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// Read-only state views
    pub introspector: Arc<Introspector>,
    /// Store handle for liveness probes
    pub executor: Arc<dyn KvExecutor>,
    /// Decision counters
    pub metrics: Arc<DecisionMetrics>,
    /// Process start instant for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create shared state over a store executor.
    pub fn new(config: Config, executor: Arc<dyn KvExecutor>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(Dispatcher::new(
                Arc::clone(&executor),
                Arc::new(SystemClock),
            )),
            introspector: Arc::new(Introspector::new(Arc::clone(&executor))),
            executor,
            metrics: Arc::new(DecisionMetrics::default()),
            started_at: Instant::now(),
        }
    }
}

/// HTTP server
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create the server and its store executor from configuration.
    ///
    /// A Redis connection failure at startup is fatal; store faults after
    /// startup fail open instead.
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let executor: Arc<dyn KvExecutor> = if config.redis.enabled {
            Arc::new(RedisPool::connect(&config.redis).await?)
        } else {
            warn!("Redis disabled; using in-process store (state is not shared across instances)");
            Arc::new(MemoryExecutor::new(Arc::new(SystemClock)))
        };

        Ok(Self {
            state: AppState::new(config.clone(), executor),
        })
    }

    /// Start the HTTP server and serve until shutdown.
    ///
    /// SIGINT/SIGTERM drain in-flight requests for the configured shutdown
    /// timeout before the process exits.
    pub async fn start(self) -> Result<()> {
        let config = Arc::clone(&self.state.config);
        let bind_addr = format!("{}:{}", config.server.host, config.server.port);

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        let mut server = ActixHttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Logger::default())
                .wrap(DefaultHeaders::new().add(("Server", "ratelimitd")))
                .configure(routes::configure_routes)
        })
        .shutdown_timeout(config.server.shutdown_timeout)
        .bind(&bind_addr)
        .map_err(|e| LimiterError::Server(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        if let Some(workers) = config.server.workers {
            server = server.workers(workers);
        }

        info!("HTTP server listening on {}", bind_addr);

        server
            .run()
            .await
            .map_err(|e| LimiterError::Server(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Run the server with automatic configuration loading.
///
/// Reads `config/limiter.yaml` when present, otherwise starts from defaults;
/// `PORT`, `HOST`, `REDIS_URL` and `REDIS_ENABLED` environment variables
/// override either source.
pub async fn run_server() -> Result<()> {
    let config = match Config::from_file(CONFIG_PATH).await {
        Ok(config) => config,
        Err(e) => {
            info!("No usable configuration file ({}), using defaults", e);
            Config::default()
        }
    }
    .with_env_overrides()?;

    let server = HttpServer::new(&config).await?;
    server.start().await
}
