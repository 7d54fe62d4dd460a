//! Dossier job routes: request, poll, retry.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use staffsight_core::AnalysisId;
use staffsight_jobs::JobId;

use crate::app::dto::RequestDossierBody;
use crate::app::errors::{json_error, tracker_error_to_response};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub async fn request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(analysis_id): Path<Uuid>,
    Json(body): Json<RequestDossierBody>,
) -> impl IntoResponse {
    if body.prompt.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "prompt must not be empty");
    }

    let result = services
        .tracker
        .request_job(
            tenant.tenant_id(),
            AnalysisId::from_uuid(analysis_id),
            body.prompt,
            principal.user_id(),
        )
        .await;

    match result {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "job_id": job_id })),
        )
            .into_response(),
        Err(err) => tracker_error_to_response(err),
    }
}

/// Polling endpoint: latest job for the analysis. Idempotent and safe to
/// repeat; terminal states are returned on every poll once they exist.
pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(analysis_id): Path<Uuid>,
) -> impl IntoResponse {
    match services
        .tracker
        .status(tenant.tenant_id(), AnalysisId::from_uuid(analysis_id))
    {
        Ok(Some(summary)) => Json(summary).into_response(),
        Ok(None) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no dossier job exists for this analysis",
        ),
        Err(err) => tracker_error_to_response(err),
    }
}

pub async fn retry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse {
    let result = services
        .tracker
        .retry_job(
            tenant.tenant_id(),
            JobId::from_uuid(job_id),
            principal.user_id(),
        )
        .await;

    match result {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "job_id": job_id })),
        )
            .into_response(),
        Err(err) => tracker_error_to_response(err),
    }
}
