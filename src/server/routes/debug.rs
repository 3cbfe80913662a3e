//! Read-only debugging endpoints.
//!
//! These views observe raw per-fingerprint state without running an atomic
//! program; repeated reads are safe under load.

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::error;

use crate::server::AppState;

/// GET /api/v1/bucket/{key}: raw token bucket state for a fingerprint.
pub async fn bucket_state(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let fingerprint = path.into_inner();

    match state.introspector.token_bucket_state(&fingerprint).await {
        Ok(bucket) => HttpResponse::Ok().json(json!({
            "key": fingerprint,
            "state": bucket,
        })),
        Err(err) => {
            error!(error = %err, "bucket introspection failed");
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/// GET /api/v1/sliding/{key}: sliding window admissions for a fingerprint.
pub async fn sliding_window_state(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let fingerprint = path.into_inner();

    match state.introspector.sliding_window_entries(&fingerprint).await {
        Ok(entries) => HttpResponse::Ok().json(json!({
            "key": fingerprint,
            "count": entries.len(),
            "entries": entries,
        })),
        Err(err) => {
            error!(error = %err, "sliding window introspection failed");
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}
