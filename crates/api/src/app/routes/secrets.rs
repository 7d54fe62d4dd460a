//! Integration secrets administration. Admin role required; values are
//! write-only — listings are masked and sensitive values never echo at all.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use staffsight_auth::Role;
use staffsight_webhook::{
    KEY_AUTH_HEADER_VALUE, KEY_WEBHOOK_URL, KEY_WEBHOOK_URL_TEST, SERVICE_N8N, TaskType,
};

use crate::app::dto::PutSecretBody;
use crate::app::errors::{json_error, vault_error_to_response};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

fn require_admin(principal: &PrincipalContext) -> Result<(), axum::response::Response> {
    if principal.has_role(&Role::admin()) {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required",
        ))
    }
}

pub async fn put_secret(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<PutSecretBody>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    if body.service.trim().is_empty() || body.key.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "service and key must not be empty",
        );
    }

    match services.vault.put(
        tenant.tenant_id(),
        &body.service,
        &body.key,
        &body.value,
        body.sensitive,
        principal.user_id(),
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => vault_error_to_response(err),
    }
}

pub async fn list_masked(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&principal) {
        return response;
    }

    match services.vault.list_masked(tenant.tenant_id(), &service) {
        Ok(secrets) => Json(secrets).into_response(),
        Err(err) => vault_error_to_response(err),
    }
}

/// Scenario surface for "is the n8n integration usable": reports
/// configured/not_configured per key without ever throwing.
pub async fn n8n_health(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> impl IntoResponse {
    let tenant_id = tenant.tenant_id();
    let keys = [
        KEY_WEBHOOK_URL,
        KEY_WEBHOOK_URL_TEST,
        KEY_AUTH_HEADER_VALUE,
        TaskType::Dossier.env_key(),
    ];

    let mut report = serde_json::Map::new();
    for key in keys {
        let state = if services.vault.is_configured(tenant_id, SERVICE_N8N, key) {
            "configured"
        } else {
            "not_configured"
        };
        report.insert(key.to_string(), serde_json::Value::String(state.to_string()));
    }

    Json(serde_json::Value::Object(report))
}
