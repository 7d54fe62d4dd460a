//! The form assignment record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staffsight_core::{AnalysisId, DomainError, DomainResult, EmployeeId, TenantId};

use crate::submission::SubmissionId;

macro_rules! impl_uuid_newtype {
    ($t:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub Uuid);

        impl $t {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_uuid_newtype!(AssignmentId);
impl_uuid_newtype!(FormId);
impl_uuid_newtype!(FormVersionId);

/// Assignment lifecycle status.
///
/// Forward-only; `Opened` may be skipped when the recipient completes
/// directly. `Completed` is terminal and the record becomes immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Sent,
    Opened,
    Completed,
}

impl AssignmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Completed)
    }

    /// The legal edge set, in one place.
    pub fn can_transition(from: AssignmentStatus, to: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (from, to),
            (Pending, Sent)
                | (Pending, Opened)
                | (Pending, Completed)
                | (Sent, Opened)
                | (Sent, Completed)
                | (Opened, Completed)
        )
    }
}

/// Usability of an assignment for its token holder, computed live.
///
/// Expiry is a function of `(status, token_expires_at, now)` evaluated at
/// access time; there is no background sweep flipping a stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAccess {
    Usable,
    Expired,
    AlreadyCompleted,
}

/// One questionnaire handed to one employee for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAssignment {
    pub id: AssignmentId,
    pub analysis_id: AnalysisId,
    pub form_id: FormId,
    pub form_version_id: FormVersionId,
    pub tenant_id: TenantId,
    pub recipient_id: EmployeeId,
    /// Opaque bearer token; unique, high-entropy, single-purpose.
    pub token: String,
    pub token_expires_at: DateTime<Utc>,
    pub status: AssignmentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder_count: u32,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub submission_id: Option<SubmissionId>,
    pub created_at: DateTime<Utc>,
}

impl FormAssignment {
    /// Live usability for the token holder. `Completed` wins over expiry so
    /// the recipient sees "already done" rather than "link expired".
    pub fn token_access(&self, now: DateTime<Utc>) -> TokenAccess {
        if self.status == AssignmentStatus::Completed {
            return TokenAccess::AlreadyCompleted;
        }
        if now > self.token_expires_at {
            return TokenAccess::Expired;
        }
        TokenAccess::Usable
    }

    fn transition(&mut self, to: AssignmentStatus) -> DomainResult<()> {
        if !AssignmentStatus::can_transition(self.status, to) {
            return Err(DomainError::invariant(format!(
                "illegal assignment transition {:?} -> {:?}",
                self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(AssignmentStatus::Sent)?;
        self.sent_at = Some(now);
        Ok(())
    }

    pub fn mark_opened(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(AssignmentStatus::Opened)?;
        self.opened_at = Some(now);
        Ok(())
    }

    pub fn mark_completed(
        &mut self,
        submission_id: SubmissionId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition(AssignmentStatus::Completed)?;
        self.submission_id = Some(submission_id);
        self.completed_at = Some(now);
        Ok(())
    }

    /// Reminders are only valid while the assignment is `sent` or `opened`;
    /// they never change status.
    pub fn record_reminder(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !matches!(self.status, AssignmentStatus::Sent | AssignmentStatus::Opened) {
            return Err(DomainError::invariant(format!(
                "reminders are only valid while sent or opened (status: {:?})",
                self.status
            )));
        }
        self.reminder_count += 1;
        self.last_reminder_at = Some(now);
        Ok(())
    }
}
