//! Webhook target resolution: which endpoint does a task type hit.

use std::sync::Arc;

use staffsight_core::TenantId;
use staffsight_vault::SecretsVault;

/// Vault service name for the workflow engine integration.
pub const SERVICE_N8N: &str = "n8n";

/// Production endpoint key.
pub const KEY_WEBHOOK_URL: &str = "webhook_url";
/// Test endpoint key.
pub const KEY_WEBHOOK_URL_TEST: &str = "webhook_url_test";

/// Task types dispatched through the workflow engine. Each carries its own
/// environment toggle so test traffic can be flipped per task type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Dossier,
}

impl TaskType {
    /// Vault key of the per-task environment toggle.
    pub fn env_key(self) -> &'static str {
        match self {
            TaskType::Dossier => "webhook_env_dossier",
        }
    }
}

/// A resolved dispatch target.
///
/// `is_test` is not discarded after resolution: it is persisted onto any job
/// created from it so test traffic stays distinguishable for reporting and
/// cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub is_test: bool,
}

pub struct WebhookTargetResolver {
    vault: Arc<SecretsVault>,
    /// Optional process-level production fallback
    /// (`STAFFSIGHT_N8N_WEBHOOK_URL`), for deployments that share one
    /// endpoint across tenants.
    fallback_url: Option<String>,
}

impl WebhookTargetResolver {
    pub fn new(vault: Arc<SecretsVault>, fallback_url: Option<String>) -> Self {
        Self {
            vault,
            fallback_url,
        }
    }

    /// Resolve the endpoint for a task type, or `None` when the integration
    /// is not configured. The environment toggle defaults to production:
    /// anything other than a literal `"test"` means production.
    pub fn resolve(&self, tenant_id: TenantId, task: TaskType) -> Option<WebhookTarget> {
        let env = self
            .vault
            .get_cached(tenant_id, SERVICE_N8N, task.env_key());
        let is_test = env.as_deref().map(str::trim) == Some("test");

        let url = if is_test {
            self.vault
                .get_cached(tenant_id, SERVICE_N8N, KEY_WEBHOOK_URL_TEST)
        } else {
            self.vault
                .get_cached(tenant_id, SERVICE_N8N, KEY_WEBHOOK_URL)
                .or_else(|| self.fallback_url.clone())
        };

        let url = url?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        Some(WebhookTarget { url, is_test })
    }
}
