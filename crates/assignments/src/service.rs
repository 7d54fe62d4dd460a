//! Assignment lifecycle service.
//!
//! Staff operations (create/remind/remove) are tenant-scoped; the token
//! operations (resolve/submit) authenticate by bearer token alone and are
//! the only mutation paths available to an unauthenticated caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use staffsight_core::{AnalysisId, Clock, DomainError, EmployeeId, TenantId};

use crate::assignment::{
    AssignmentId, AssignmentStatus, FormAssignment, FormId, FormVersionId, TokenAccess,
};
use crate::catalog::{CatalogError, FormCatalog};
use crate::delivery::{DeliveryError, FormDelivery, FormInvite, RecipientDirectory};
use crate::store::{AssignmentStore, AssignmentStoreError};
use crate::submission::{FormResponse, FormSubmission, SubmissionId};
use crate::token;

/// Errors on the staff-facing paths.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("assignment not found")]
    NotFound,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Operation not legal in the assignment's current status.
    #[error("{0}")]
    IllegalState(String),

    #[error("completed assignments cannot be deleted")]
    CompletedImmutable,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Store(AssignmentStoreError),
}

impl From<AssignmentStoreError> for AssignmentError {
    fn from(value: AssignmentStoreError) -> Self {
        match value {
            AssignmentStoreError::NotFound => AssignmentError::NotFound,
            // Cross-tenant lookups read as absence; existence must not leak.
            AssignmentStoreError::TenantIsolation => AssignmentError::NotFound,
            AssignmentStoreError::CompletedImmutable => AssignmentError::CompletedImmutable,
            other => AssignmentError::Store(other),
        }
    }
}

impl From<DomainError> for AssignmentError {
    fn from(value: DomainError) -> Self {
        AssignmentError::IllegalState(value.to_string())
    }
}

/// Errors on the token-holder paths. The first three are deliberate,
/// distinct UX outcomes: "invalid" and "already completed" are terminal,
/// "expired" is re-issuable by staff.
#[derive(Debug, Error)]
pub enum TokenAccessError {
    #[error("unknown token")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("this form was already submitted")]
    AlreadyCompleted,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AssignmentStoreError> for TokenAccessError {
    fn from(value: AssignmentStoreError) -> Self {
        TokenAccessError::Internal(value.to_string())
    }
}

impl From<DomainError> for TokenAccessError {
    fn from(value: DomainError) -> Self {
        TokenAccessError::Internal(value.to_string())
    }
}

/// What a token holder gets to see about their task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub assignment_id: AssignmentId,
    pub form_id: FormId,
    pub form_version_id: FormVersionId,
    pub status: AssignmentStatus,
    pub due_date: Option<DateTime<Utc>>,
}

impl FormView {
    fn of(assignment: &FormAssignment) -> Self {
        Self {
            assignment_id: assignment.id,
            form_id: assignment.form_id,
            form_version_id: assignment.form_version_id,
            status: assignment.status,
            due_date: assignment.due_date,
        }
    }
}

pub struct AssignmentService {
    store: Arc<dyn AssignmentStore>,
    catalog: Arc<dyn FormCatalog>,
    delivery: Arc<dyn FormDelivery>,
    directory: Arc<dyn RecipientDirectory>,
    clock: Arc<dyn Clock>,
}

impl AssignmentService {
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        catalog: Arc<dyn FormCatalog>,
        delivery: Arc<dyn FormDelivery>,
        directory: Arc<dyn RecipientDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            delivery,
            directory,
            clock,
        }
    }

    /// Assign a questionnaire to an employee.
    ///
    /// Delivery is attempted immediately when the recipient has a contact
    /// address; a delivery failure does not roll the assignment back — it
    /// stays `pending` and remains retriable via a later send.
    pub fn create(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
        form_id: FormId,
        recipient_id: EmployeeId,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<FormAssignment, AssignmentError> {
        let form_version_id = self.catalog.resolve_active(tenant_id, form_id)?;
        let now = self.clock.now();

        let mut assignment = FormAssignment {
            id: AssignmentId::new(),
            analysis_id,
            form_id,
            form_version_id,
            tenant_id,
            recipient_id,
            token: token::generate(),
            token_expires_at: now + Duration::days(token::TOKEN_TTL_DAYS),
            status: AssignmentStatus::Pending,
            due_date,
            sent_at: None,
            opened_at: None,
            completed_at: None,
            reminder_count: 0,
            last_reminder_at: None,
            submission_id: None,
            created_at: now,
        };
        self.store.insert(assignment.clone())?;

        if let Some(contact) = self.directory.contact(tenant_id, recipient_id) {
            match self.delivery.send(&FormInvite::initial(contact, &assignment)) {
                Ok(()) => {
                    assignment.mark_sent(now)?;
                    self.store.update(&assignment)?;
                }
                Err(err) => {
                    warn!(assignment_id = %assignment.id, error = %err, "initial form delivery failed; assignment stays pending");
                }
            }
        }

        info!(assignment_id = %assignment.id, %analysis_id, "form assignment created");
        Ok(assignment)
    }

    /// Look up the task behind a bearer token.
    ///
    /// A successful resolution on a `pending`/`sent` assignment advances it
    /// to `opened`.
    pub fn resolve_by_token(&self, raw_token: &str) -> Result<FormView, TokenAccessError> {
        let mut assignment = self
            .store
            .find_by_token(raw_token)?
            .ok_or(TokenAccessError::Invalid)?;

        match assignment.token_access(self.clock.now()) {
            TokenAccess::AlreadyCompleted => return Err(TokenAccessError::AlreadyCompleted),
            TokenAccess::Expired => return Err(TokenAccessError::Expired),
            TokenAccess::Usable => {}
        }

        if matches!(
            assignment.status,
            AssignmentStatus::Pending | AssignmentStatus::Sent
        ) {
            assignment.mark_opened(self.clock.now())?;
            self.store.update(&assignment)?;
        }

        Ok(FormView::of(&assignment))
    }

    /// Submit answers for a bearer token. One-time: re-validates expiry and
    /// completion at submission time, not just at page load.
    pub fn submit(
        &self,
        raw_token: &str,
        answers: serde_json::Value,
    ) -> Result<SubmissionId, TokenAccessError> {
        let mut assignment = self
            .store
            .find_by_token(raw_token)?
            .ok_or(TokenAccessError::Invalid)?;

        let now = self.clock.now();
        match assignment.token_access(now) {
            TokenAccess::AlreadyCompleted => return Err(TokenAccessError::AlreadyCompleted),
            TokenAccess::Expired => return Err(TokenAccessError::Expired),
            TokenAccess::Usable => {}
        }

        let submission = FormSubmission {
            id: SubmissionId::new(),
            assignment_id: assignment.id,
            tenant_id: assignment.tenant_id,
            analysis_id: assignment.analysis_id,
            answers,
            submitted_at: now,
        };
        self.store.insert_submission(submission.clone())?;
        assignment.mark_completed(submission.id, now)?;
        self.store.update(&assignment)?;

        info!(assignment_id = %assignment.id, submission_id = %submission.id, "form submitted");
        Ok(submission.id)
    }

    /// Re-send the original form link. Legal only from `sent`/`opened`; the
    /// token is not rotated and the status does not change.
    pub fn remind(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<FormAssignment, AssignmentError> {
        let mut assignment = self
            .store
            .get(tenant_id, assignment_id)?
            .ok_or(AssignmentError::NotFound)?;

        if !matches!(
            assignment.status,
            AssignmentStatus::Sent | AssignmentStatus::Opened
        ) {
            return Err(AssignmentError::IllegalState(format!(
                "reminders are only valid while sent or opened (status: {:?})",
                assignment.status
            )));
        }

        let contact = self
            .directory
            .contact(tenant_id, assignment.recipient_id)
            .ok_or_else(|| DeliveryError::Failed("recipient has no contact address".to_string()))?;
        self.delivery
            .send(&FormInvite::reminder(contact, &assignment))?;

        assignment.record_reminder(self.clock.now())?;
        self.store.update(&assignment)?;
        Ok(assignment)
    }

    /// Delete an assignment. Completed assignments are audit records and are
    /// never deletable.
    pub fn remove(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
    ) -> Result<(), AssignmentError> {
        // Surface NotFound before the immutability check so a bogus id does
        // not read as "exists but completed".
        self.store
            .get(tenant_id, assignment_id)?
            .ok_or(AssignmentError::NotFound)?;
        self.store.delete(tenant_id, assignment_id)?;
        Ok(())
    }

    pub fn list_for_analysis(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormAssignment>, AssignmentError> {
        Ok(self.store.list_for_analysis(tenant_id, analysis_id)?)
    }

    /// Responses from completed assignments, for the dossier payload.
    pub fn completed_responses(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormResponse>, AssignmentError> {
        Ok(self.store.completed_responses(tenant_id, analysis_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use staffsight_core::ManualClock;

    use crate::catalog::{FormDefinition, FormVisibility, InMemoryFormCatalog};
    use crate::store::InMemoryAssignmentStore;

    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<FormInvite>>,
        fail: AtomicBool,
    }

    impl FormDelivery for RecordingDelivery {
        fn send(&self, invite: &FormInvite) -> Result<(), DeliveryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DeliveryError::Failed("smtp unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(invite.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct StaticDirectory {
        contacts: HashMap<EmployeeId, String>,
    }

    impl RecipientDirectory for StaticDirectory {
        fn contact(&self, _tenant_id: TenantId, employee_id: EmployeeId) -> Option<String> {
            self.contacts.get(&employee_id).cloned()
        }
    }

    struct Fixture {
        service: AssignmentService,
        delivery: Arc<RecordingDelivery>,
        clock: Arc<ManualClock>,
        tenant: TenantId,
        form: FormDefinition,
        recipient: EmployeeId,
    }

    fn fixture_with_contact(has_contact: bool) -> Fixture {
        let tenant = TenantId::new();
        let recipient = EmployeeId::new();

        let catalog = InMemoryFormCatalog::arc();
        let form = FormDefinition {
            id: FormId::new(),
            current_version: FormVersionId::new(),
            active: true,
            visibility: FormVisibility::Global,
        };
        catalog.upsert(form.clone());

        let mut directory = StaticDirectory::default();
        if has_contact {
            directory
                .contacts
                .insert(recipient, "employee@example.com".to_string());
        }

        let delivery = Arc::new(RecordingDelivery::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = AssignmentService::new(
            InMemoryAssignmentStore::arc(),
            catalog,
            delivery.clone(),
            Arc::new(directory),
            clock.clone(),
        );

        Fixture {
            service,
            delivery,
            clock,
            tenant,
            form,
            recipient,
        }
    }

    #[test]
    fn create_delivers_and_advances_to_sent() {
        let f = fixture_with_contact(true);
        let due = Utc::now() + Duration::days(5);

        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, Some(due))
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Sent);
        assert!(assignment.sent_at.is_some());
        assert_eq!(f.delivery.sent.lock().unwrap().len(), 1);
        assert_eq!(
            assignment.token_expires_at,
            assignment.created_at + Duration::days(token::TOKEN_TTL_DAYS)
        );
    }

    #[test]
    fn create_without_contact_stays_pending() {
        let f = fixture_with_contact(false);

        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Pending);
        assert!(f.delivery.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn delivery_failure_does_not_roll_back_creation() {
        let f = fixture_with_contact(true);
        f.delivery.fail.store(true, Ordering::SeqCst);

        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Pending);
        // The record exists and the token still resolves.
        assert!(f.service.resolve_by_token(&assignment.token).is_ok());
    }

    #[test]
    fn inactive_form_is_rejected() {
        let f = fixture_with_contact(true);
        let catalog = InMemoryFormCatalog::arc();
        let mut inactive = f.form.clone();
        inactive.active = false;
        catalog.upsert(inactive.clone());

        let service = AssignmentService::new(
            InMemoryAssignmentStore::arc(),
            catalog,
            f.delivery.clone(),
            Arc::new(StaticDirectory::default()),
            f.clock.clone(),
        );

        assert!(matches!(
            service.create(f.tenant, AnalysisId::new(), inactive.id, f.recipient, None),
            Err(AssignmentError::Catalog(CatalogError::Inactive))
        ));
    }

    #[test]
    fn resolve_advances_sent_to_opened() {
        let f = fixture_with_contact(true);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        let view = f.service.resolve_by_token(&assignment.token).unwrap();
        assert_eq!(view.status, AssignmentStatus::Opened);

        // Resolving again keeps it opened.
        let view = f.service.resolve_by_token(&assignment.token).unwrap();
        assert_eq!(view.status, AssignmentStatus::Opened);
    }

    #[test]
    fn unknown_token_is_invalid() {
        let f = fixture_with_contact(true);
        assert!(matches!(
            f.service.resolve_by_token("deadbeef"),
            Err(TokenAccessError::Invalid)
        ));
    }

    #[test]
    fn submit_is_single_use() {
        let f = fixture_with_contact(true);
        let analysis = AnalysisId::new();
        let assignment = f
            .service
            .create(f.tenant, analysis, f.form.id, f.recipient, None)
            .unwrap();

        f.service
            .submit(&assignment.token, serde_json::json!({"q1": "fine"}))
            .unwrap();

        assert!(matches!(
            f.service
                .submit(&assignment.token, serde_json::json!({"q1": "again"})),
            Err(TokenAccessError::AlreadyCompleted)
        ));

        // Exactly one submission was recorded.
        let responses = f.service.completed_responses(f.tenant, analysis).unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].answers, serde_json::json!({"q1": "fine"}));
    }

    #[test]
    fn expiry_beats_pending_status_and_ignores_reminders() {
        let f = fixture_with_contact(true);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        f.service.remind(f.tenant, assignment.id).unwrap();

        f.clock
            .advance(Duration::days(token::TOKEN_TTL_DAYS) + Duration::seconds(1));

        assert!(matches!(
            f.service.resolve_by_token(&assignment.token),
            Err(TokenAccessError::Expired)
        ));
        assert!(matches!(
            f.service
                .submit(&assignment.token, serde_json::json!({})),
            Err(TokenAccessError::Expired)
        ));
    }

    #[test]
    fn remind_increments_count_without_status_change() {
        let f = fixture_with_contact(true);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();
        assert_eq!(assignment.reminder_count, 0);

        let reminded = f.service.remind(f.tenant, assignment.id).unwrap();
        assert_eq!(reminded.reminder_count, 1);
        assert_eq!(reminded.status, AssignmentStatus::Sent);
        assert!(reminded.last_reminder_at.is_some());

        // The reminder reuses the original token.
        let invites = f.delivery.sent.lock().unwrap();
        assert_eq!(invites.len(), 2);
        assert_eq!(invites[1].token, assignment.token);
        assert!(invites[1].is_reminder);
    }

    #[test]
    fn remind_from_pending_is_illegal() {
        let f = fixture_with_contact(false);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        assert!(matches!(
            f.service.remind(f.tenant, assignment.id),
            Err(AssignmentError::IllegalState(_))
        ));
    }

    #[test]
    fn remove_refuses_completed() {
        let f = fixture_with_contact(true);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        f.service
            .submit(&assignment.token, serde_json::json!({}))
            .unwrap();

        assert!(matches!(
            f.service.remove(f.tenant, assignment.id),
            Err(AssignmentError::CompletedImmutable)
        ));
    }

    #[test]
    fn remove_works_before_completion_and_cross_tenant_reads_as_absent() {
        let f = fixture_with_contact(true);
        let assignment = f
            .service
            .create(f.tenant, AnalysisId::new(), f.form.id, f.recipient, None)
            .unwrap();

        assert!(matches!(
            f.service.remove(TenantId::new(), assignment.id),
            Err(AssignmentError::NotFound)
        ));

        f.service.remove(f.tenant, assignment.id).unwrap();
        assert!(matches!(
            f.service.resolve_by_token(&assignment.token),
            Err(TokenAccessError::Invalid)
        ));
    }
}
