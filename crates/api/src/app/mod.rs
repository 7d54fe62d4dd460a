//! HTTP API application wiring (Axum router + service wiring).
//!
//! Structure:
//! - `services.rs`: infrastructure wiring (vault, tracker, assignment service)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, routing::post, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config)?;
    Ok(build_app_with_services(&config.jwt_secret, services))
}

/// Router over pre-built services (tests wire their own).
pub fn build_app_with_services(jwt_secret: &str, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(staffsight_auth::Hs256JwtValidator::new(
        jwt_secret.as_bytes().to_vec(),
    ));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require auth + tenant context.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    // Public surface: health, the token-gated form entry points, and the
    // workflow engine's callback (authenticated by shared secret, not JWT).
    Router::new()
        .route("/health", get(routes::system::health))
        .route(
            "/forms/:token",
            get(routes::forms::fetch).post(routes::forms::submit),
        )
        .route(
            "/webhooks/dossier-callback",
            post(routes::callback::dossier_callback),
        )
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
