//! Token-gated public routes.
//!
//! The bearer token in the path is the sole authentication. Fetching a form
//! advances `pending`/`sent` assignments to `opened`; submitting is
//! one-time and re-validates expiry at submission time.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};

use crate::app::dto::SubmitFormBody;
use crate::app::errors::token_error_to_response;
use crate::app::services::AppServices;

pub async fn fetch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match services.assignments.resolve_by_token(&token) {
        Ok(view) => Json(view).into_response(),
        Err(err) => token_error_to_response(err),
    }
}

pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
    Json(body): Json<SubmitFormBody>,
) -> impl IntoResponse {
    match services.assignments.submit(&token, body.answers) {
        Ok(submission_id) => {
            Json(serde_json::json!({ "submission_id": submission_id })).into_response()
        }
        Err(err) => token_error_to_response(err),
    }
}
