//! HTTP route modules
//!
//! - `ratelimit` - the decision endpoint
//! - `debug` - read-only state views
//! - `health` - liveness and metrics

pub mod debug;
pub mod health;
pub mod ratelimit;

use actix_web::web;

/// Wire up every route on the application.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(health::metrics))
        .service(
            web::scope("/api/v1")
                .route("/ratelimit", web::post().to(ratelimit::check_rate_limit))
                .route("/bucket/{key}", web::get().to(debug::bucket_state))
                .route("/sliding/{key}", web::get().to(debug::sliding_window_state)),
        );
}
