//! The JSON envelope handed to the workflow engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use staffsight_assignments::{FormId, FormResponse};
use staffsight_core::{AnalysisId, TenantId};
use staffsight_jobs::JobId;

use crate::sources::SubjectInfo;

/// One completed questionnaire response inside the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponsePayload {
    pub form_id: FormId,
    pub answers: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

impl From<FormResponse> for FormResponsePayload {
    fn from(value: FormResponse) -> Self {
        Self {
            form_id: value.form_id,
            answers: value.answers,
            submitted_at: value.submitted_at,
        }
    }
}

/// The dispatch envelope. Opaque to us beyond its shape; the workflow engine
/// interprets it and answers via `callback_url`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierPayload {
    pub job_id: JobId,
    pub analysis_id: AnalysisId,
    pub organization_id: TenantId,
    pub callback_url: String,
    pub subject: SubjectInfo,
    pub transcripts: Vec<String>,
    pub documents: Vec<String>,
    pub form_responses: Vec<FormResponsePayload>,
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_camel_case() {
        let payload = DossierPayload {
            job_id: JobId::new(),
            analysis_id: AnalysisId::new(),
            organization_id: TenantId::new(),
            callback_url: "https://app.example/webhooks/dossier-callback".to_string(),
            subject: SubjectInfo {
                employee_name: "Sam Doe".to_string(),
                position: Some("Engineer".to_string()),
                department: None,
            },
            transcripts: vec!["t1".to_string()],
            documents: vec![],
            form_responses: vec![],
            prompt: "summarize".to_string(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("jobId").is_some());
        assert!(value.get("callbackUrl").is_some());
        assert!(value.get("formResponses").is_some());
        assert_eq!(value["subject"]["employeeName"], "Sam Doe");
        // Absent optionals are omitted, not null.
        assert!(value["subject"].get("department").is_none());
    }
}
