//! ratelimitd - distributed rate-limiting decision service
//!
//! Admit/deny decisions shared across a fleet through Redis.

use ratelimitd::server;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging system
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    server::run_server().await.map_err(|e| e.into())
}
