//! `staffsight-jobs` — dossier job lifecycle.
//!
//! One [`DossierJob`](job::DossierJob) is one attempt to produce an
//! AI-derived dossier for an analysis via the external workflow engine. The
//! crate owns the job state machine and its single-flight guarantee; actual
//! dispatch is behind the [`DispatchPort`](dispatch::DispatchPort) seam so
//! the webhook layer (and test fakes) can plug in.

pub mod callback;
pub mod dispatch;
pub mod job;
pub mod store;
pub mod tracker;

pub use callback::{CallbackCommand, CallbackStatus};
pub use dispatch::{DispatchOutcome, DispatchPort};
pub use job::{DossierJob, JobId, JobStatus, TokenUsage};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use tracker::{CallbackApplied, JobSummary, JobTracker, JobTrackerError};
