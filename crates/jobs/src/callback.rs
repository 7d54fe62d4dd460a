//! The inbound callback contract (consumed from the external workflow
//! engine, not owned here).
//!
//! The same `jobId` may be delivered more than once; application is
//! idempotent and a redelivery for an already-terminal job is a no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use staffsight_core::TenantId;

use crate::job::{JobId, TokenUsage};

/// Terminal outcome reported by the external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Completed,
    Failed,
}

/// One callback delivery, already authenticated by the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackCommand {
    pub job_id: JobId,
    pub organization_id: TenantId,
    pub status: CallbackStatus,
    #[serde(default)]
    pub result_data: Option<JsonValue>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
    #[serde(default)]
    pub error_message: Option<String>,
}
