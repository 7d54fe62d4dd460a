//! Job storage abstraction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use staffsight_core::{AnalysisId, TenantId};

use crate::job::{DossierJob, JobId};

/// Job store abstraction.
pub trait JobStore: Send + Sync {
    /// Insert a new job, guarded by the single-flight invariant: the insert
    /// fails with [`JobStoreError::AlreadyInProgress`] when any non-terminal
    /// job exists for the same `(tenant, analysis)`. Check and insert are one
    /// atomic operation — implementations must not expose a read-then-write
    /// race (a SQL backend would use a partial unique index).
    fn insert_if_idle(&self, job: DossierJob) -> Result<JobId, JobStoreError>;

    /// Get a job by ID, tenant-scoped.
    fn get(&self, tenant_id: TenantId, job_id: JobId) -> Result<Option<DossierJob>, JobStoreError>;

    /// Persist an updated job.
    fn update(&self, job: &DossierJob) -> Result<(), JobStoreError>;

    /// The most recently created job for an analysis (polling target).
    fn latest_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Option<DossierJob>, JobStoreError>;

    /// All jobs for an analysis, oldest first (audit history).
    fn list_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<DossierJob>, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("tenant isolation violation")]
    TenantIsolation,
    #[error("a job for this analysis is already in progress")]
    AlreadyInProgress,
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory job store for tests/dev.
///
/// The single write lock makes `insert_if_idle` serializable by construction.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, DossierJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl JobStore for InMemoryJobStore {
    fn insert_if_idle(&self, job: DossierJob) -> Result<JobId, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();

        let in_flight = jobs.values().any(|j| {
            j.tenant_id == job.tenant_id
                && j.analysis_id == job.analysis_id
                && !j.status.is_terminal()
        });
        if in_flight {
            return Err(JobStoreError::AlreadyInProgress);
        }

        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, tenant_id: TenantId, job_id: JobId) -> Result<Option<DossierJob>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        match jobs.get(&job_id) {
            Some(job) if job.tenant_id == tenant_id => Ok(Some(job.clone())),
            Some(_) => Err(JobStoreError::TenantIsolation),
            None => Ok(None),
        }
    }

    fn update(&self, job: &DossierJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get(&job.id) {
            Some(existing) if existing.tenant_id != job.tenant_id => {
                Err(JobStoreError::TenantIsolation)
            }
            Some(_) => {
                jobs.insert(job.id, job.clone());
                Ok(())
            }
            None => Err(JobStoreError::NotFound(job.id)),
        }
    }

    fn latest_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Option<DossierJob>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs
            .values()
            .filter(|j| j.tenant_id == tenant_id && j.analysis_id == analysis_id)
            .max_by_key(|j| j.created_at)
            .cloned())
    }

    fn list_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<DossierJob>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        let mut result: Vec<_> = jobs
            .values()
            .filter(|j| j.tenant_id == tenant_id && j.analysis_id == analysis_id)
            .cloned()
            .collect();
        result.sort_by_key(|j| j.created_at);
        Ok(result)
    }
}
