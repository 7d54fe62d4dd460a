//! Inbound callback from the external workflow engine.
//!
//! Authenticated by the same vault-held shared secret the dispatcher sends
//! outbound. Idempotent under redelivery: a second delivery for a terminal
//! job answers 200 with `applied: false` and changes nothing.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use staffsight_jobs::{CallbackApplied, CallbackCommand, JobTrackerError};
use staffsight_webhook::{DEFAULT_AUTH_HEADER, KEY_AUTH_HEADER_NAME, KEY_AUTH_HEADER_VALUE, SERVICE_N8N};

use crate::app::errors::{json_error, tracker_error_to_response};
use crate::app::services::AppServices;

pub async fn dossier_callback(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(command): Json<CallbackCommand>,
) -> impl IntoResponse {
    let tenant_id = command.organization_id;

    // No configured secret means no callback surface, not an open one.
    let Some(expected) = services
        .vault
        .get_cached(tenant_id, SERVICE_N8N, KEY_AUTH_HEADER_VALUE)
    else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "not_configured",
            "callback secret is not configured for this organization",
        );
    };
    let header_name = services
        .vault
        .get_cached(tenant_id, SERVICE_N8N, KEY_AUTH_HEADER_NAME)
        .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string());

    let provided = headers
        .get(header_name.as_str())
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected.as_str()) {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "invalid callback credential",
        );
    }

    match services.tracker.apply_callback(command) {
        Ok(applied) => Json(serde_json::json!({
            "applied": applied == CallbackApplied::Applied,
        }))
        .into_response(),
        Err(JobTrackerError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "job not found")
        }
        Err(err) => tracker_error_to_response(err),
    }
}
