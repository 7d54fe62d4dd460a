//! Dispatch port: "can we hand this job to the external system".
//!
//! What a dispatch outcome *means* for the job record is the tracker's
//! concern; implementations only report whether the handoff happened.

use async_trait::async_trait;

use crate::job::DossierJob;

/// Result of one dispatch attempt. Exactly one HTTP call per invocation —
/// retries are an explicit user action, never built in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    /// Whether the resolved webhook target was the test environment. Persisted
    /// onto the job so test traffic stays distinguishable.
    pub is_test: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn success(is_test: bool) -> Self {
        Self {
            success: true,
            is_test,
            error: None,
        }
    }

    pub fn failure(is_test: bool, error: impl Into<String>) -> Self {
        Self {
            success: false,
            is_test,
            error: Some(error.into()),
        }
    }
}

/// Hands a job's payload to the external workflow engine.
#[async_trait]
pub trait DispatchPort: Send + Sync {
    async fn dispatch(&self, job: &DossierJob) -> DispatchOutcome;
}
