//! `staffsight-webhook` — outbound integration with the external workflow
//! engine (n8n).
//!
//! Resolves which endpoint a task type should hit (test vs. production),
//! assembles the dossier payload from its source aggregates, signs the
//! request with the vault-held secret and performs exactly one POST per
//! dispatch. What an outcome means for the job record is the tracker's
//! business, not ours.

pub mod client;
pub mod dispatcher;
pub mod payload;
pub mod sources;
pub mod target;

pub use client::{HttpWebhookClient, WebhookClient, WebhookClientError, DISPATCH_TIMEOUT};
pub use dispatcher::{
    DossierDispatcher, DEFAULT_AUTH_HEADER, KEY_AUTH_HEADER_NAME, KEY_AUTH_HEADER_VALUE,
};
pub use payload::{DossierPayload, FormResponsePayload};
pub use sources::{DossierSources, SourceError, SubjectInfo};
pub use target::{
    TaskType, WebhookTarget, WebhookTargetResolver, KEY_WEBHOOK_URL, KEY_WEBHOOK_URL_TEST,
    SERVICE_N8N,
};
