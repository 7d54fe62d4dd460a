//! Analysis input content + employee contact registration.
//!
//! The minimal parent-entity surface the dispatcher's source aggregates
//! read from; the full analysis CRUD lives outside this core.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use staffsight_core::{AnalysisId, EmployeeId};

use crate::app::dto::{PutContactBody, PutContentBody};
use crate::app::errors::json_error;
use crate::app::services::AppServices;
use crate::context::TenantContext;

pub async fn put_content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(analysis_id): Path<Uuid>,
    Json(body): Json<PutContentBody>,
) -> impl IntoResponse {
    if body.subject.employee_name.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "subject employee name must not be empty",
        );
    }

    services.content.upsert_content(
        tenant.tenant_id(),
        AnalysisId::from_uuid(analysis_id),
        body.subject,
        body.transcripts,
        body.documents,
    );
    StatusCode::NO_CONTENT.into_response()
}

pub async fn put_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(employee_id): Path<Uuid>,
    Json(body): Json<PutContactBody>,
) -> impl IntoResponse {
    if body.email.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "email must not be empty",
        );
    }

    services.content.set_contact(
        tenant.tenant_id(),
        EmployeeId::from_uuid(employee_id),
        body.email,
    );
    StatusCode::NO_CONTENT.into_response()
}
