//! Infrastructure wiring for the API process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Context;

use staffsight_assignments::{
    AssignmentService, AssignmentStore, FormResponse, InMemoryAssignmentStore, InMemoryFormCatalog,
    NoopDelivery, RecipientDirectory,
};
use staffsight_core::{AnalysisId, Clock, EmployeeId, SystemClock, TenantId};
use staffsight_jobs::{InMemoryJobStore, JobTracker};
use staffsight_vault::{InMemorySecretStore, SecretCipher, SecretsVault};
use staffsight_webhook::{
    DossierDispatcher, DossierSources, HttpWebhookClient, SourceError, SubjectInfo, WebhookClient,
    WebhookTargetResolver,
};

use crate::config::ApiConfig;

/// Everything the routes need, wired once at startup.
pub struct AppServices {
    pub vault: Arc<SecretsVault>,
    pub tracker: JobTracker,
    pub assignments: AssignmentService,
    pub catalog: Arc<InMemoryFormCatalog>,
    pub content: Arc<AnalysisContentStore>,
    pub clock: Arc<dyn Clock>,
}

/// Build the full service graph from the environment. The vault master key
/// is the one hard startup requirement: without it, refuse to boot.
pub fn build_services(config: &ApiConfig) -> anyhow::Result<Arc<AppServices>> {
    let cipher = SecretCipher::from_env().context("vault master key required at startup")?;
    build_services_with_cipher(config, cipher)
}

/// Variant with an explicit cipher, used by tests to avoid process-global
/// environment state.
pub fn build_services_with_cipher(
    config: &ApiConfig,
    cipher: SecretCipher,
) -> anyhow::Result<Arc<AppServices>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let secret_store = InMemorySecretStore::arc();
    let vault = Arc::new(SecretsVault::new(secret_store, cipher, clock.clone()));

    let assignment_store = InMemoryAssignmentStore::arc();
    let content = Arc::new(AnalysisContentStore::new(assignment_store.clone()));

    let client: Arc<dyn WebhookClient> =
        Arc::new(HttpWebhookClient::new().context("failed to build webhook http client")?);
    let resolver = WebhookTargetResolver::new(vault.clone(), config.n8n_fallback_url.clone());
    let dispatcher = Arc::new(DossierDispatcher::new(
        vault.clone(),
        resolver,
        content.clone(),
        client,
        config.callback_base_url.clone(),
    ));

    let tracker = JobTracker::new(InMemoryJobStore::arc(), dispatcher, clock.clone());

    let catalog = InMemoryFormCatalog::arc();
    let assignments = AssignmentService::new(
        assignment_store,
        catalog.clone(),
        Arc::new(NoopDelivery),
        content.clone(),
        clock.clone(),
    );

    Ok(Arc::new(AppServices {
        vault,
        tracker,
        assignments,
        catalog,
        content,
        clock,
    }))
}

type AnalysisKey = (TenantId, AnalysisId);

/// In-memory analysis inputs: subject metadata, interview transcripts and
/// extracted document text, plus the employee contact directory.
///
/// Feeds the dossier payload via [`DossierSources`]; form responses come
/// from the assignment store so only completed submissions ever leave.
pub struct AnalysisContentStore {
    subjects: RwLock<HashMap<AnalysisKey, SubjectInfo>>,
    transcripts: RwLock<HashMap<AnalysisKey, Vec<String>>>,
    documents: RwLock<HashMap<AnalysisKey, Vec<String>>>,
    contacts: RwLock<HashMap<(TenantId, EmployeeId), String>>,
    assignments: Arc<dyn AssignmentStore>,
}

impl AnalysisContentStore {
    pub fn new(assignments: Arc<dyn AssignmentStore>) -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            transcripts: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            contacts: RwLock::new(HashMap::new()),
            assignments,
        }
    }

    pub fn upsert_content(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
        subject: SubjectInfo,
        transcripts: Vec<String>,
        documents: Vec<String>,
    ) {
        let key = (tenant_id, analysis_id);
        self.subjects.write().unwrap().insert(key, subject);
        self.transcripts.write().unwrap().insert(key, transcripts);
        self.documents.write().unwrap().insert(key, documents);
    }

    pub fn set_contact(&self, tenant_id: TenantId, employee_id: EmployeeId, email: String) {
        self.contacts
            .write()
            .unwrap()
            .insert((tenant_id, employee_id), email);
    }
}

impl DossierSources for AnalysisContentStore {
    fn subject(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<SubjectInfo, SourceError> {
        self.subjects
            .read()
            .unwrap()
            .get(&(tenant_id, analysis_id))
            .cloned()
            .ok_or_else(|| SourceError::Unavailable("analysis has no subject metadata".to_string()))
    }

    fn transcripts(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<String>, SourceError> {
        Ok(self
            .transcripts
            .read()
            .unwrap()
            .get(&(tenant_id, analysis_id))
            .cloned()
            .unwrap_or_default())
    }

    fn documents(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<String>, SourceError> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .get(&(tenant_id, analysis_id))
            .cloned()
            .unwrap_or_default())
    }

    fn form_responses(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormResponse>, SourceError> {
        self.assignments
            .completed_responses(tenant_id, analysis_id)
            .map_err(|e| SourceError::Unavailable(e.to_string()))
    }
}

impl RecipientDirectory for AnalysisContentStore {
    fn contact(&self, tenant_id: TenantId, employee_id: EmployeeId) -> Option<String> {
        self.contacts
            .read()
            .unwrap()
            .get(&(tenant_id, employee_id))
            .cloned()
    }
}
