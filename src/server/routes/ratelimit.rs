//! Rate limit decision endpoint.

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, info};

use crate::core::types::DecisionRequest;
use crate::server::AppState;
use crate::utils::error::LimiterError;

/// POST /api/v1/ratelimit
///
/// Returns 200 with the decision for any well-formed request, admit or deny;
/// 400 with an error body for malformed input. Store trouble never surfaces
/// here; the dispatcher admits on store faults.
pub async fn check_rate_limit(
    state: web::Data<AppState>,
    request: web::Json<DecisionRequest>,
) -> HttpResponse {
    let request = request.into_inner();

    match state.dispatcher.decide(&request).await {
        Ok(decision) => {
            state.metrics.record(decision.allowed);
            info!(
                fingerprint = %request.fingerprint,
                algorithm = %decision.algorithm,
                allowed = decision.allowed,
                remaining = decision.remaining,
                "rate limit decision"
            );
            HttpResponse::Ok().json(decision)
        }
        Err(LimiterError::Validation(message)) => {
            state.metrics.record_rejected();
            HttpResponse::BadRequest().json(json!({ "error": message }))
        }
        Err(err) => {
            error!(error = %err, "decision failed");
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}
