//! The external job dispatcher.
//!
//! "Can we reach the external system" lives here; "what that means for the
//! job record" stays with the tracker. Each invocation performs at most one
//! HTTP call — retries are an explicit user action upstream.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use staffsight_core::TenantId;
use staffsight_jobs::{DispatchOutcome, DispatchPort, DossierJob};
use staffsight_vault::SecretsVault;

use crate::client::WebhookClient;
use crate::payload::DossierPayload;
use crate::sources::DossierSources;
use crate::target::{TaskType, WebhookTargetResolver, SERVICE_N8N};

/// Vault key of the signing header's name. Optional; defaults to
/// [`DEFAULT_AUTH_HEADER`].
pub const KEY_AUTH_HEADER_NAME: &str = "auth_header_name";
/// Vault key of the signing header's value. A payload is never sent without
/// it.
pub const KEY_AUTH_HEADER_VALUE: &str = "auth_header_value";

pub const DEFAULT_AUTH_HEADER: &str = "authorization";

pub struct DossierDispatcher {
    vault: Arc<SecretsVault>,
    resolver: WebhookTargetResolver,
    sources: Arc<dyn DossierSources>,
    client: Arc<dyn WebhookClient>,
    /// Public base URL of this deployment; the callback route is derived
    /// from it.
    callback_base_url: String,
}

impl DossierDispatcher {
    pub fn new(
        vault: Arc<SecretsVault>,
        resolver: WebhookTargetResolver,
        sources: Arc<dyn DossierSources>,
        client: Arc<dyn WebhookClient>,
        callback_base_url: String,
    ) -> Self {
        Self {
            vault,
            resolver,
            sources,
            client,
            callback_base_url,
        }
    }

    fn callback_url(&self) -> String {
        format!(
            "{}/webhooks/dossier-callback",
            self.callback_base_url.trim_end_matches('/')
        )
    }

    fn signing_header(&self, tenant_id: TenantId) -> Option<(String, String)> {
        // Absence of the signing value is a hard precondition failure for
        // dispatch, distinct from an unconfigured URL: a payload must never
        // go out unsigned.
        let value = self
            .vault
            .get_cached(tenant_id, SERVICE_N8N, KEY_AUTH_HEADER_VALUE)?;
        let name = self
            .vault
            .get_cached(tenant_id, SERVICE_N8N, KEY_AUTH_HEADER_NAME)
            .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string());
        Some((name, value))
    }

    async fn dispatch_inner(&self, job: &DossierJob) -> DispatchOutcome {
        let tenant_id = job.tenant_id;

        let Some(target) = self.resolver.resolve(tenant_id, TaskType::Dossier) else {
            return DispatchOutcome::failure(false, "n8n webhook URL is not configured");
        };

        let Some((header_name, header_value)) = self.signing_header(tenant_id) else {
            return DispatchOutcome::failure(
                target.is_test,
                "n8n signing secret is not configured; refusing to send unsigned",
            );
        };

        let payload = match self.gather(job) {
            Ok(payload) => payload,
            Err(error) => return DispatchOutcome::failure(target.is_test, error),
        };

        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                return DispatchOutcome::failure(
                    target.is_test,
                    format!("failed to encode payload: {e}"),
                )
            }
        };

        debug!(
            job_id = %job.id,
            url = %target.url,
            is_test = target.is_test,
            transcripts = payload.transcripts.len(),
            documents = payload.documents.len(),
            form_responses = payload.form_responses.len(),
            "dispatching dossier payload"
        );

        match self
            .client
            .post_json(&target.url, &header_name, &header_value, &body)
            .await
        {
            Ok(()) => DispatchOutcome::success(target.is_test),
            Err(err) => {
                warn!(job_id = %job.id, error = %err, "dossier dispatch failed");
                DispatchOutcome::failure(target.is_test, err.to_string())
            }
        }
    }

    fn gather(&self, job: &DossierJob) -> Result<DossierPayload, String> {
        let tenant_id = job.tenant_id;
        let analysis_id = job.analysis_id;

        let subject = self
            .sources
            .subject(tenant_id, analysis_id)
            .map_err(|e| e.to_string())?;

        let transcripts: Vec<String> = self
            .sources
            .transcripts(tenant_id, analysis_id)
            .map_err(|e| e.to_string())?
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();

        let documents: Vec<String> = self
            .sources
            .documents(tenant_id, analysis_id)
            .map_err(|e| e.to_string())?
            .into_iter()
            .filter(|d| !d.trim().is_empty())
            .collect();

        let form_responses = self
            .sources
            .form_responses(tenant_id, analysis_id)
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(DossierPayload {
            job_id: job.id,
            analysis_id,
            organization_id: tenant_id,
            callback_url: self.callback_url(),
            subject,
            transcripts,
            documents,
            form_responses,
            prompt: job.prompt.clone(),
        })
    }
}

#[async_trait]
impl DispatchPort for DossierDispatcher {
    async fn dispatch(&self, job: &DossierJob) -> DispatchOutcome {
        self.dispatch_inner(job).await
    }
}
