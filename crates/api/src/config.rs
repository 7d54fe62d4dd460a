//! Process configuration from environment variables.

/// API process configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `STAFFSIGHT_BIND_ADDR`, default `0.0.0.0:8080`.
    pub bind_addr: String,
    /// `STAFFSIGHT_JWT_SECRET`; falls back to an insecure dev default.
    pub jwt_secret: String,
    /// `STAFFSIGHT_CALLBACK_BASE_URL` — the public base URL the workflow
    /// engine calls back to.
    pub callback_base_url: String,
    /// `STAFFSIGHT_N8N_WEBHOOK_URL` — optional process-level production
    /// webhook fallback for deployments sharing one endpoint.
    pub n8n_fallback_url: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("STAFFSIGHT_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("STAFFSIGHT_JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        Self {
            bind_addr: std::env::var("STAFFSIGHT_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            callback_base_url: std::env::var("STAFFSIGHT_CALLBACK_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            n8n_fallback_url: std::env::var("STAFFSIGHT_N8N_WEBHOOK_URL").ok(),
        }
    }
}
