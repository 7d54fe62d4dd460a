//! Form catalog port: which questionnaire definitions exist, which version
//! is current, and which tenants may use them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use staffsight_core::TenantId;

use crate::assignment::{FormId, FormVersionId};

/// Who may assign a form definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormVisibility {
    /// Available to every tenant.
    Global,
    /// Available only to explicitly granted tenants.
    Tenants(Vec<TenantId>),
}

/// One questionnaire definition in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefinition {
    pub id: FormId,
    pub current_version: FormVersionId,
    pub active: bool,
    pub visibility: FormVisibility,
}

impl FormDefinition {
    pub fn granted_to(&self, tenant_id: TenantId) -> bool {
        match &self.visibility {
            FormVisibility::Global => true,
            FormVisibility::Tenants(tenants) => tenants.contains(&tenant_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("form definition not found")]
    NotFound,
    #[error("form definition is inactive")]
    Inactive,
    #[error("form definition is not available to this tenant")]
    NotGranted,
}

/// Resolves a form definition to its current version, enforcing activity and
/// tenant grants.
pub trait FormCatalog: Send + Sync {
    fn resolve_active(
        &self,
        tenant_id: TenantId,
        form_id: FormId,
    ) -> Result<FormVersionId, CatalogError>;
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryFormCatalog {
    forms: RwLock<HashMap<FormId, FormDefinition>>,
}

impl InMemoryFormCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn upsert(&self, definition: FormDefinition) {
        self.forms
            .write()
            .unwrap()
            .insert(definition.id, definition);
    }
}

impl FormCatalog for InMemoryFormCatalog {
    fn resolve_active(
        &self,
        tenant_id: TenantId,
        form_id: FormId,
    ) -> Result<FormVersionId, CatalogError> {
        let forms = self.forms.read().unwrap();
        let form = forms.get(&form_id).ok_or(CatalogError::NotFound)?;
        if !form.active {
            return Err(CatalogError::Inactive);
        }
        if !form.granted_to(tenant_id) {
            return Err(CatalogError::NotGranted);
        }
        Ok(form.current_version)
    }
}
