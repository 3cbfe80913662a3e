//! # ratelimitd
//!
//! Distributed rate-limiting decision service. Callers submit a fingerprint
//! (user id, API key, any opaque identifier) plus a policy of limit, window,
//! algorithm, and optional token cost, and receive an admit/deny decision
//! with the bookkeeping needed to pace themselves: remaining budget, a reset
//! instant, and a retry hint on denial.
//!
//! ## Features
//!
//! - **Three algorithms**: token bucket, fixed window, sliding window
//! - **Globally consistent**: per-fingerprint state lives in Redis and every
//!   state transition runs as a single server-side atomic program
//! - **Fail-open**: a store fault admits the request instead of failing it
//! - **Self-expiring state**: idle fingerprints cost nothing
//! - **Single-instance mode**: in-process store when Redis is disabled
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ratelimitd::core::{Clock, DecisionRequest, Dispatcher, SystemClock};
//! use ratelimitd::storage::MemoryExecutor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!     let executor = Arc::new(MemoryExecutor::new(Arc::clone(&clock)));
//!     let dispatcher = Dispatcher::new(executor, clock);
//!
//!     let request = DecisionRequest::new("user-42", 100, 60);
//!     let decision = dispatcher.decide(&request).await?;
//!     println!("allowed: {}, remaining: {}", decision.allowed, decision.remaining);
//!     Ok(())
//! }
//! ```
//!
//! ## Service Mode
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     ratelimitd::server::run_server().await.map_err(|e| e.into())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use crate::config::Config;
pub use crate::core::{Algorithm, DecisionRequest, DecisionResponse, Dispatcher};
pub use crate::utils::error::{LimiterError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, env!("CARGO_PKG_NAME"));
    }
}
