//! `staffsight-assignments` — token-gated form assignments.
//!
//! An assignment binds a questionnaire to one employee for one analysis. It
//! is the only aggregate mutable by an unauthenticated actor: the bearer
//! token in the form link is, by itself, sufficient authorization to open
//! and submit that one assignment. Everything else requires staff.

pub mod assignment;
pub mod catalog;
pub mod delivery;
pub mod service;
pub mod store;
pub mod submission;
pub mod token;

pub use assignment::{
    AssignmentId, AssignmentStatus, FormAssignment, FormId, FormVersionId, TokenAccess,
};
pub use catalog::{CatalogError, FormCatalog, FormDefinition, FormVisibility, InMemoryFormCatalog};
pub use delivery::{DeliveryError, FormDelivery, FormInvite, NoopDelivery, RecipientDirectory};
pub use service::{AssignmentError, AssignmentService, FormView, TokenAccessError};
pub use store::{AssignmentStore, AssignmentStoreError, InMemoryAssignmentStore};
pub use submission::{FormResponse, FormSubmission, SubmissionId};
