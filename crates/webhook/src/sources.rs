//! Source aggregates feeding the dossier payload.
//!
//! Three independent inputs hang off an analysis: free-text interview
//! transcripts, extracted document text, and completed questionnaire
//! responses. The port keeps this crate ignorant of where they live.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use staffsight_assignments::FormResponse;
use staffsight_core::{AnalysisId, TenantId};

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("source data unavailable: {0}")]
    Unavailable(String),
}

/// Subject metadata included with the payload so the workflow engine can
/// address the employee without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Read access to an analysis's input aggregates.
pub trait DossierSources: Send + Sync {
    fn subject(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<SubjectInfo, SourceError>;

    /// Interview transcripts, raw. Empty entries are the dispatcher's problem
    /// to drop.
    fn transcripts(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<String>, SourceError>;

    /// Extracted document text, raw.
    fn documents(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<String>, SourceError>;

    /// Responses from completed assignments only; implementations must never
    /// expose the content of a non-completed assignment.
    fn form_responses(
        &self,
        tenant_id: TenantId,
        analysis_id: AnalysisId,
    ) -> Result<Vec<FormResponse>, SourceError>;
}
