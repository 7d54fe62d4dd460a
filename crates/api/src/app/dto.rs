//! Request/response DTOs and JSON mapping helpers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use staffsight_webhook::SubjectInfo;

/// `POST /api/v1/analyses/:analysis_id/dossier`
#[derive(Debug, Deserialize)]
pub struct RequestDossierBody {
    pub prompt: String,
}

/// `POST /api/v1/analyses/:analysis_id/assignments`
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentBody {
    pub form_id: Uuid,
    pub recipient_id: Uuid,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// `POST /forms/:token`
#[derive(Debug, Deserialize)]
pub struct SubmitFormBody {
    pub answers: serde_json::Value,
}

/// `PUT /api/v1/admin/secrets`
#[derive(Debug, Deserialize)]
pub struct PutSecretBody {
    pub service: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub sensitive: bool,
}

/// `PUT /api/v1/analyses/:analysis_id/content`
#[derive(Debug, Deserialize)]
pub struct PutContentBody {
    pub subject: SubjectInfo,
    #[serde(default)]
    pub transcripts: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// `PUT /api/v1/employees/:employee_id/contact`
#[derive(Debug, Deserialize)]
pub struct PutContactBody {
    pub email: String,
}
