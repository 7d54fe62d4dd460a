//! Form submission records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staffsight_core::{AnalysisId, TenantId};

use crate::assignment::{AssignmentId, FormId};

/// Unique submission identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The answers a recipient submitted through their token link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: SubmissionId,
    pub assignment_id: AssignmentId,
    pub tenant_id: TenantId,
    pub analysis_id: AnalysisId,
    pub answers: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

/// A completed questionnaire response as fed into the dossier payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormResponse {
    pub form_id: FormId,
    pub answers: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}
