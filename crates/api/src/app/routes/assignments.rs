//! Staff-side assignment routes: create, list, remind, remove.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use staffsight_assignments::{AssignmentId, FormId};
use staffsight_core::{AnalysisId, EmployeeId};

use crate::app::dto::CreateAssignmentBody;
use crate::app::errors::assignment_error_to_response;
use crate::app::services::AppServices;
use crate::context::TenantContext;

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(analysis_id): Path<Uuid>,
    Json(body): Json<CreateAssignmentBody>,
) -> impl IntoResponse {
    let result = services.assignments.create(
        tenant.tenant_id(),
        AnalysisId::from_uuid(analysis_id),
        FormId::from_uuid(body.form_id),
        EmployeeId::from_uuid(body.recipient_id),
        body.due_date,
    );

    match result {
        Ok(assignment) => (StatusCode::CREATED, Json(assignment)).into_response(),
        Err(err) => assignment_error_to_response(err),
    }
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(analysis_id): Path<Uuid>,
) -> impl IntoResponse {
    match services
        .assignments
        .list_for_analysis(tenant.tenant_id(), AnalysisId::from_uuid(analysis_id))
    {
        Ok(assignments) => Json(assignments).into_response(),
        Err(err) => assignment_error_to_response(err),
    }
}

pub async fn remind(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(assignment_id): Path<Uuid>,
) -> impl IntoResponse {
    match services
        .assignments
        .remind(tenant.tenant_id(), AssignmentId::from_uuid(assignment_id))
    {
        Ok(assignment) => Json(assignment).into_response(),
        Err(err) => assignment_error_to_response(err),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(assignment_id): Path<Uuid>,
) -> impl IntoResponse {
    match services
        .assignments
        .remove(tenant.tenant_id(), AssignmentId::from_uuid(assignment_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => assignment_error_to_response(err),
    }
}
