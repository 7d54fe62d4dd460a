//! Consistent error responses.
//!
//! Every component error is mapped here into a stable `{error, message}`
//! JSON shape; nothing below the route layer leaks raw errors to clients.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use staffsight_assignments::{AssignmentError, CatalogError, TokenAccessError};
use staffsight_jobs::JobTrackerError;
use staffsight_vault::VaultError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn tracker_error_to_response(err: JobTrackerError) -> axum::response::Response {
    match err {
        // Distinct from a generic failure: the caller disables the action
        // instead of surfacing an error.
        JobTrackerError::AlreadyInProgress => json_error(
            StatusCode::CONFLICT,
            "already_in_progress",
            "a dossier job for this analysis is already in progress",
        ),
        JobTrackerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
        JobTrackerError::NotFailed => json_error(
            StatusCode::CONFLICT,
            "not_failed",
            "only failed jobs can be retried",
        ),
        JobTrackerError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        JobTrackerError::Domain(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", e.to_string())
        }
    }
}

pub fn assignment_error_to_response(err: AssignmentError) -> axum::response::Response {
    match err {
        AssignmentError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "assignment not found")
        }
        AssignmentError::Catalog(CatalogError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "form_not_found", "form definition not found")
        }
        AssignmentError::Catalog(CatalogError::Inactive) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "form_inactive", "form definition is inactive")
        }
        AssignmentError::Catalog(CatalogError::NotGranted) => json_error(
            StatusCode::FORBIDDEN,
            "form_not_granted",
            "form definition is not available to this organization",
        ),
        AssignmentError::IllegalState(msg) => {
            json_error(StatusCode::CONFLICT, "illegal_state", msg)
        }
        AssignmentError::CompletedImmutable => json_error(
            StatusCode::CONFLICT,
            "completed_immutable",
            "completed assignments cannot be deleted",
        ),
        AssignmentError::Delivery(e) => {
            json_error(StatusCode::BAD_GATEWAY, "delivery_failed", e.to_string())
        }
        AssignmentError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

/// The three token outcomes are deliberately distinct: they drive different
/// recipient-facing screens and different staff remediation.
pub fn token_error_to_response(err: TokenAccessError) -> axum::response::Response {
    match err {
        TokenAccessError::Invalid => {
            json_error(StatusCode::NOT_FOUND, "invalid_token", "this form link is not valid")
        }
        TokenAccessError::Expired => {
            json_error(StatusCode::GONE, "expired", "this form link has expired")
        }
        TokenAccessError::AlreadyCompleted => json_error(
            StatusCode::CONFLICT,
            "already_completed",
            "this form was already submitted",
        ),
        TokenAccessError::Internal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn vault_error_to_response(err: VaultError) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "vault_error", err.to_string())
}
