use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod assignments;
pub mod callback;
pub mod content;
pub mod dossier;
pub mod forms;
pub mod secrets;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/v1/whoami", get(system::whoami))
        .route(
            "/api/v1/analyses/:analysis_id/dossier",
            post(dossier::request).get(dossier::status),
        )
        .route("/api/v1/dossier-jobs/:job_id/retry", post(dossier::retry))
        .route(
            "/api/v1/analyses/:analysis_id/assignments",
            post(assignments::create).get(assignments::list),
        )
        .route(
            "/api/v1/assignments/:assignment_id/remind",
            post(assignments::remind),
        )
        .route(
            "/api/v1/assignments/:assignment_id",
            delete(assignments::remove),
        )
        .route(
            "/api/v1/analyses/:analysis_id/content",
            put(content::put_content),
        )
        .route(
            "/api/v1/employees/:employee_id/contact",
            put(content::put_contact),
        )
        .route("/api/v1/admin/secrets", put(secrets::put_secret))
        .route("/api/v1/admin/secrets/:service", get(secrets::list_masked))
        .route(
            "/api/v1/admin/integrations/n8n/health",
            get(secrets::n8n_health),
        )
}
