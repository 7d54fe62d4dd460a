//! The dossier job record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use staffsight_core::{AnalysisId, DomainError, DomainResult, TenantId, UserId};

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job execution status.
///
/// Transitions run forward only; `Completed` and `Failed` are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, dispatch not yet confirmed.
    Pending,
    /// Accepted by the external workflow engine; awaiting its callback.
    Processing,
    /// Terminal: callback delivered a result.
    Completed,
    /// Terminal: dispatch failed or callback reported failure.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The legal edge set, in one place. Every mutation path consults this
    /// table instead of comparing statuses ad hoc.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (from, to),
            (Pending, Processing) | (Pending, Completed) | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

/// Model token accounting reported by the external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// One attempt to produce a dossier for an analysis.
///
/// Retries never mutate a terminal record; they create a fresh job for the
/// same analysis, preserving audit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DossierJob {
    pub id: JobId,
    pub analysis_id: AnalysisId,
    pub tenant_id: TenantId,
    pub status: JobStatus,
    pub prompt: String,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub model_used: Option<String>,
    pub token_usage: Option<TokenUsage>,
    pub requested_by: UserId,
    /// Fixed at creation from the webhook resolver's answer; never re-derived
    /// from callback data.
    pub is_test: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DossierJob {
    pub fn new(
        tenant_id: TenantId,
        analysis_id: AnalysisId,
        prompt: String,
        requested_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new(),
            analysis_id,
            tenant_id,
            status: JobStatus::Pending,
            prompt,
            result: None,
            error_message: None,
            model_used: None,
            token_usage: None,
            requested_by,
            is_test: false,
            started_at: None,
            completed_at: None,
            created_at: now,
        }
    }

    fn transition(&mut self, to: JobStatus) -> DomainResult<()> {
        if !JobStatus::can_transition(self.status, to) {
            return Err(DomainError::invariant(format!(
                "illegal job transition {:?} -> {:?}",
                self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    /// Dispatch succeeded: the external engine has accepted the work.
    pub fn mark_processing(&mut self, is_test: bool, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(JobStatus::Processing)?;
        self.is_test = is_test;
        self.started_at = Some(now);
        Ok(())
    }

    /// Terminal success, driven by the external callback.
    pub fn mark_completed(
        &mut self,
        result: Option<JsonValue>,
        model_used: Option<String>,
        token_usage: Option<TokenUsage>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition(JobStatus::Completed)?;
        self.result = result;
        self.model_used = model_used;
        self.token_usage = token_usage;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Terminal failure: dispatch failure or a failed callback.
    pub fn mark_failed(&mut self, error: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(JobStatus::Failed)?;
        self.error_message = Some(error);
        self.completed_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> DossierJob {
        DossierJob::new(
            TenantId::new(),
            AnalysisId::new(),
            "summarize".to_string(),
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn happy_path_stamps_timestamps() {
        let mut job = new_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.created_at <= Utc::now());

        job.mark_processing(false, Utc::now()).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_none());

        job.mark_completed(Some(serde_json::json!({"dossier": "text"})), Some("gpt-4o".into()), None, Utc::now())
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn dispatch_failure_goes_straight_to_failed() {
        let mut job = new_job();
        job.mark_failed("webhook unreachable".to_string(), Utc::now()).unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.completed_at.is_some());
        assert_eq!(job.error_message.as_deref(), Some("webhook unreachable"));
    }

    #[test]
    fn terminal_states_are_closed() {
        let mut job = new_job();
        job.mark_processing(false, Utc::now()).unwrap();
        job.mark_completed(None, None, None, Utc::now()).unwrap();

        assert!(job.mark_failed("late failure".to_string(), Utc::now()).is_err());
        assert!(job.mark_processing(false, Utc::now()).is_err());

        let mut failed = new_job();
        failed.mark_failed("boom".to_string(), Utc::now()).unwrap();
        assert!(failed.mark_completed(None, None, None, Utc::now()).is_err());
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use JobStatus::*;
        assert!(JobStatus::can_transition(Pending, Processing));
        assert!(JobStatus::can_transition(Pending, Failed));
        assert!(JobStatus::can_transition(Pending, Completed));
        assert!(JobStatus::can_transition(Processing, Completed));
        assert!(JobStatus::can_transition(Processing, Failed));

        assert!(!JobStatus::can_transition(Completed, Failed));
        assert!(!JobStatus::can_transition(Failed, Pending));
        assert!(!JobStatus::can_transition(Processing, Pending));
        assert!(!JobStatus::can_transition(Completed, Processing));
    }
}
