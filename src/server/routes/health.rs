//! Health check and metrics endpoints.

use std::sync::atomic::Ordering;

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::debug;

use crate::server::AppState;

/// GET /health: liveness, gated on the store answering a ping.
///
/// Load balancers take a 503 here as a signal to drain the instance; the
/// decision endpoint itself keeps admitting through store trouble.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    debug!("Health check requested");

    match state.executor.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "store": "connected",
            "time": chrono::Utc::now().timestamp(),
        })),
        Err(err) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unhealthy",
            "store": "disconnected",
            "error": err.to_string(),
        })),
    }
}

/// GET /metrics: decision counters in Prometheus text format.
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let body = format!(
        r#"# HELP ratelimitd_uptime_seconds Total uptime of the service in seconds
# TYPE ratelimitd_uptime_seconds counter
ratelimitd_uptime_seconds {}

# HELP ratelimitd_decisions_allowed_total Admitted decisions
# TYPE ratelimitd_decisions_allowed_total counter
ratelimitd_decisions_allowed_total {}

# HELP ratelimitd_decisions_denied_total Denied decisions
# TYPE ratelimitd_decisions_denied_total counter
ratelimitd_decisions_denied_total {}

# HELP ratelimitd_requests_rejected_total Requests rejected as malformed
# TYPE ratelimitd_requests_rejected_total counter
ratelimitd_requests_rejected_total {}
"#,
        state.started_at.elapsed().as_secs(),
        state.metrics.allowed.load(Ordering::Relaxed),
        state.metrics.denied.load(Ordering::Relaxed),
        state.metrics.rejected.load(Ordering::Relaxed),
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(body)
}
