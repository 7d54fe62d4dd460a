//! Assignment + submission storage abstraction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use staffsight_core::{AnalysisId, TenantId};

use crate::assignment::{AssignmentId, AssignmentStatus, FormAssignment};
use crate::submission::{FormResponse, FormSubmission, SubmissionId};

/// Assignment store abstraction. Submissions live alongside assignments
/// because the only write path for a submission is an assignment completing.
pub trait AssignmentStore: Send + Sync {
    fn insert(&self, assignment: FormAssignment) -> Result<AssignmentId, AssignmentStoreError>;

    fn get(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<Option<FormAssignment>, AssignmentStoreError>;

    /// Token lookup is deliberately tenant-free: the bearer token is the only
    /// thing the anonymous caller has.
    fn find_by_token(&self, token: &str) -> Result<Option<FormAssignment>, AssignmentStoreError>;

    fn update(&self, assignment: &FormAssignment) -> Result<(), AssignmentStoreError>;

    /// Hard-delete. Refuses completed assignments; they are audit records.
    fn delete(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<(), AssignmentStoreError>;

    fn list_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormAssignment>, AssignmentStoreError>;

    fn insert_submission(&self, submission: FormSubmission) -> Result<(), AssignmentStoreError>;

    /// Responses from completed assignments only; the raw content of a
    /// non-completed assignment never leaves the store.
    fn completed_responses(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormResponse>, AssignmentStoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AssignmentStoreError {
    #[error("assignment not found")]
    NotFound,
    #[error("tenant isolation violation")]
    TenantIsolation,
    #[error("completed assignments cannot be deleted")]
    CompletedImmutable,
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory assignment store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    assignments: RwLock<HashMap<AssignmentId, FormAssignment>>,
    submissions: RwLock<HashMap<SubmissionId, FormSubmission>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn insert(&self, assignment: FormAssignment) -> Result<AssignmentId, AssignmentStoreError> {
        let id = assignment.id;
        self.assignments.write().unwrap().insert(id, assignment);
        Ok(id)
    }

    fn get(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<Option<FormAssignment>, AssignmentStoreError> {
        let assignments = self.assignments.read().unwrap();
        match assignments.get(&assignment_id) {
            Some(a) if a.tenant_id == tenant_id => Ok(Some(a.clone())),
            Some(_) => Err(AssignmentStoreError::TenantIsolation),
            None => Ok(None),
        }
    }

    fn find_by_token(&self, token: &str) -> Result<Option<FormAssignment>, AssignmentStoreError> {
        let assignments = self.assignments.read().unwrap();
        Ok(assignments.values().find(|a| a.token == token).cloned())
    }

    fn update(&self, assignment: &FormAssignment) -> Result<(), AssignmentStoreError> {
        let mut assignments = self.assignments.write().unwrap();
        match assignments.get(&assignment.id) {
            Some(existing) if existing.tenant_id != assignment.tenant_id => {
                Err(AssignmentStoreError::TenantIsolation)
            }
            Some(_) => {
                assignments.insert(assignment.id, assignment.clone());
                Ok(())
            }
            None => Err(AssignmentStoreError::NotFound),
        }
    }

    fn delete(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<(), AssignmentStoreError> {
        let mut assignments = self.assignments.write().unwrap();
        match assignments.get(&assignment_id) {
            Some(a) if a.tenant_id != tenant_id => Err(AssignmentStoreError::TenantIsolation),
            Some(a) if a.status == AssignmentStatus::Completed => {
                Err(AssignmentStoreError::CompletedImmutable)
            }
            Some(_) => {
                assignments.remove(&assignment_id);
                Ok(())
            }
            None => Err(AssignmentStoreError::NotFound),
        }
    }

    fn list_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormAssignment>, AssignmentStoreError> {
        let assignments = self.assignments.read().unwrap();
        let mut result: Vec<_> = assignments
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.analysis_id == analysis_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    fn insert_submission(&self, submission: FormSubmission) -> Result<(), AssignmentStoreError> {
        self.submissions
            .write()
            .unwrap()
            .insert(submission.id, submission);
        Ok(())
    }

    fn completed_responses(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormResponse>, AssignmentStoreError> {
        let assignments = self.assignments.read().unwrap();
        let submissions = self.submissions.read().unwrap();

        let mut responses: Vec<(chrono::DateTime<chrono::Utc>, FormResponse)> = assignments
            .values()
            .filter(|a| {
                a.tenant_id == tenant_id
                    && a.analysis_id == analysis_id
                    && a.status == AssignmentStatus::Completed
            })
            .filter_map(|a| {
                let submission = a.submission_id.and_then(|id| submissions.get(&id))?;
                Some((
                    a.created_at,
                    FormResponse {
                        form_id: a.form_id,
                        answers: submission.answers.clone(),
                        submitted_at: submission.submitted_at,
                    },
                ))
            })
            .collect();

        responses.sort_by_key(|(created_at, _)| *created_at);
        Ok(responses.into_iter().map(|(_, r)| r).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use staffsight_core::EmployeeId;

    use crate::assignment::{FormId, FormVersionId};
    use crate::token;

    fn assignment_for(tenant: TenantId, analysis: AnalysisId) -> FormAssignment {
        let now = Utc::now();
        FormAssignment {
            id: AssignmentId::new(),
            analysis_id: analysis,
            form_id: FormId::new(),
            form_version_id: FormVersionId::new(),
            tenant_id: tenant,
            recipient_id: EmployeeId::new(),
            token: token::generate(),
            token_expires_at: now + Duration::days(token::TOKEN_TTL_DAYS),
            status: AssignmentStatus::Pending,
            due_date: None,
            sent_at: None,
            opened_at: None,
            completed_at: None,
            reminder_count: 0,
            last_reminder_at: None,
            submission_id: None,
            created_at: now,
        }
    }

    #[test]
    fn find_by_token_matches_exactly() {
        let store = InMemoryAssignmentStore::new();
        let assignment = assignment_for(TenantId::new(), AnalysisId::new());
        let token = assignment.token.clone();
        store.insert(assignment.clone()).unwrap();

        assert_eq!(
            store.find_by_token(&token).unwrap().unwrap().id,
            assignment.id
        );
        assert!(store.find_by_token("unknown-token").unwrap().is_none());
    }

    #[test]
    fn cross_tenant_reads_are_rejected() {
        let store = InMemoryAssignmentStore::new();
        let assignment = assignment_for(TenantId::new(), AnalysisId::new());
        let id = store.insert(assignment).unwrap();

        assert!(matches!(
            store.get(TenantId::new(), id),
            Err(AssignmentStoreError::TenantIsolation)
        ));
    }

    #[test]
    fn completed_assignments_cannot_be_deleted() {
        let store = InMemoryAssignmentStore::new();
        let tenant = TenantId::new();
        let mut assignment = assignment_for(tenant, AnalysisId::new());
        let now = Utc::now();
        assignment.mark_sent(now).unwrap();
        assignment.mark_completed(SubmissionId::new(), now).unwrap();
        let id = store.insert(assignment).unwrap();

        assert!(matches!(
            store.delete(tenant, id),
            Err(AssignmentStoreError::CompletedImmutable)
        ));
    }

    #[test]
    fn completed_responses_exclude_unfinished_assignments() {
        let store = InMemoryAssignmentStore::new();
        let tenant = TenantId::new();
        let analysis = AnalysisId::new();
        let now = Utc::now();

        // One completed with a submission, one still open.
        let mut done = assignment_for(tenant, analysis);
        let submission = FormSubmission {
            id: SubmissionId::new(),
            assignment_id: done.id,
            tenant_id: tenant,
            analysis_id: analysis,
            answers: serde_json::json!({"q1": "yes"}),
            submitted_at: now,
        };
        done.mark_opened(now).unwrap();
        done.mark_completed(submission.id, now).unwrap();
        store.insert(done).unwrap();
        store.insert_submission(submission).unwrap();

        store.insert(assignment_for(tenant, analysis)).unwrap();

        let responses = store.completed_responses(tenant, analysis).unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].answers, serde_json::json!({"q1": "yes"}));
    }
}
