//! Job state tracker: owns the lifecycle of dossier job records.
//!
//! Mutated from two trust boundaries: authenticated staff actions
//! (request/retry) and the external engine's callback. Every mutation goes
//! through the job's transition table; the single-flight guarantee lives in
//! the store's atomic insert.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use staffsight_core::{AnalysisId, Clock, DomainError, TenantId, UserId};

use crate::callback::{CallbackCommand, CallbackStatus};
use crate::dispatch::DispatchPort;
use crate::job::{DossierJob, JobId, JobStatus, TokenUsage};
use crate::store::{JobStore, JobStoreError};

#[derive(Debug, Error)]
pub enum JobTrackerError {
    /// Single-flight conflict: callers react to this differently than to a
    /// real failure (e.g. disable the "generate" action).
    #[error("a dossier job for this analysis is already in progress")]
    AlreadyInProgress,

    #[error("job not found")]
    NotFound,

    /// Retry requested for a job that is not in the `failed` state.
    #[error("job is not in a failed state")]
    NotFailed,

    #[error(transparent)]
    Store(JobStoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<JobStoreError> for JobTrackerError {
    fn from(value: JobStoreError) -> Self {
        match value {
            JobStoreError::AlreadyInProgress => JobTrackerError::AlreadyInProgress,
            // Cross-tenant lookups read as absence; existence must not leak.
            JobStoreError::TenantIsolation => JobTrackerError::NotFound,
            other => JobTrackerError::Store(other),
        }
    }
}

/// Outcome of applying one callback delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackApplied {
    Applied,
    /// Redelivery for an already-terminal job: a no-op, not an error, and
    /// previously stored result data is left untouched.
    AlreadyTerminal,
}

/// Polling view of the latest job for an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub model_used: Option<String>,
    pub token_usage: Option<TokenUsage>,
    pub is_test: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds since `started_at` while the job is still `processing`. The
    /// operational staleness signal: a callback that never arrives shows up
    /// as a growing age, not as an automatic failure.
    pub processing_age_secs: Option<i64>,
}

pub struct JobTracker {
    store: Arc<dyn JobStore>,
    dispatcher: Arc<dyn DispatchPort>,
    clock: Arc<dyn Clock>,
}

impl JobTracker {
    pub fn new(
        store: Arc<dyn JobStore>,
        dispatcher: Arc<dyn DispatchPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
        }
    }

    /// Create and dispatch a new dossier job for an analysis.
    ///
    /// Returns the job id whether dispatch succeeded or not, so the caller
    /// can surface status immediately; a dispatch failure lands the job in
    /// `failed` with the dispatcher's error recorded.
    pub async fn request_job(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
        prompt: String,
        requested_by: UserId,
    ) -> Result<JobId, JobTrackerError> {
        let job = DossierJob::new(tenant_id, analysis_id, prompt, requested_by, self.clock.now());
        let job_id = self.store.insert_if_idle(job.clone())?;

        let outcome = self.dispatcher.dispatch(&job).await;
        let now = self.clock.now();
        let mut job = job;
        if outcome.success {
            job.mark_processing(outcome.is_test, now)?;
            info!(%job_id, %analysis_id, is_test = outcome.is_test, "dossier job dispatched");
        } else {
            job.is_test = outcome.is_test;
            let error = outcome
                .error
                .unwrap_or_else(|| "dispatch failed".to_string());
            warn!(%job_id, %analysis_id, error, "dossier job dispatch failed");
            job.mark_failed(error, now)?;
        }
        self.store.update(&job)?;

        Ok(job_id)
    }

    /// Retry a failed job by creating a fresh one for the same analysis with
    /// the same prompt. The failed record is left untouched.
    pub async fn retry_job(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        requested_by: UserId,
    ) -> Result<JobId, JobTrackerError> {
        let job = self
            .store
            .get(tenant_id, job_id)
            .map_err(JobTrackerError::from)?
            .ok_or(JobTrackerError::NotFound)?;

        if job.status != JobStatus::Failed {
            return Err(JobTrackerError::NotFailed);
        }

        self.request_job(tenant_id, job.analysis_id, job.prompt, requested_by)
            .await
    }

    /// Apply one callback delivery from the external engine. Idempotent under
    /// redelivery: a second delivery for a terminal job is a no-op.
    pub fn apply_callback(
        &self,
        command: CallbackCommand,
    ) -> Result<CallbackApplied, JobTrackerError> {
        let mut job = self
            .store
            .get(command.organization_id, command.job_id)
            .map_err(JobTrackerError::from)?
            .ok_or(JobTrackerError::NotFound)?;

        if job.status.is_terminal() {
            info!(job_id = %job.id, "callback redelivery for terminal job ignored");
            return Ok(CallbackApplied::AlreadyTerminal);
        }

        let now = self.clock.now();
        match command.status {
            CallbackStatus::Completed => job.mark_completed(
                command.result_data,
                command.model_used,
                command.token_usage,
                now,
            )?,
            CallbackStatus::Failed => {
                let error = command
                    .error_message
                    .unwrap_or_else(|| "external workflow reported failure".to_string());
                job.mark_failed(error, now)?;
            }
        }
        self.store.update(&job)?;

        Ok(CallbackApplied::Applied)
    }

    /// Latest job for an analysis, for polling. Safe to repeat: once a
    /// terminal state exists it is returned on every subsequent poll.
    pub fn status(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Option<JobSummary>, JobTrackerError> {
        let Some(job) = self
            .store
            .latest_for_analysis(tenant_id, analysis_id)
            .map_err(JobTrackerError::from)?
        else {
            return Ok(None);
        };

        let processing_age_secs = match (job.status, job.started_at) {
            (JobStatus::Processing, Some(started_at)) => {
                Some((self.clock.now() - started_at).num_seconds())
            }
            _ => None,
        };

        Ok(Some(JobSummary {
            job_id: job.id,
            status: job.status,
            result: job.result,
            error_message: job.error_message,
            model_used: job.model_used,
            token_usage: job.token_usage,
            is_test: job.is_test,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            processing_age_secs,
        }))
    }
}
