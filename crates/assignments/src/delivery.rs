//! Delivery port: getting the form link in front of the recipient.
//!
//! Rendering and transport of the actual email are out of scope here; this
//! crate only decides *when* to send and records the outcome.

use thiserror::Error;

use staffsight_core::{EmployeeId, TenantId};

use crate::assignment::FormAssignment;

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// What the delivery channel needs to send one invite or reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInvite {
    pub contact: String,
    /// The token link is rebuilt from the original token on reminders; a
    /// reminder never rotates the token.
    pub token: String,
    pub is_reminder: bool,
}

impl FormInvite {
    pub fn initial(contact: String, assignment: &FormAssignment) -> Self {
        Self {
            contact,
            token: assignment.token.clone(),
            is_reminder: false,
        }
    }

    pub fn reminder(contact: String, assignment: &FormAssignment) -> Self {
        Self {
            contact,
            token: assignment.token.clone(),
            is_reminder: true,
        }
    }
}

/// Sends form invites. Implementations live at the infrastructure edge.
pub trait FormDelivery: Send + Sync {
    fn send(&self, invite: &FormInvite) -> Result<(), DeliveryError>;
}

/// Looks up a recipient's contact address, if they have one.
pub trait RecipientDirectory: Send + Sync {
    fn contact(&self, tenant_id: TenantId, employee_id: EmployeeId) -> Option<String>;
}

/// Delivery that silently accepts everything. Dev/wiring default.
#[derive(Debug, Default)]
pub struct NoopDelivery;

impl FormDelivery for NoopDelivery {
    fn send(&self, _invite: &FormInvite) -> Result<(), DeliveryError> {
        Ok(())
    }
}
