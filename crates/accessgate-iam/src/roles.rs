//! Role management.

use std::fmt;
use std::sync::Arc;

use accessgate_core::{
    AccessStore, PermissionRule, RoleId, RoleRecord, StoreError, permission_document,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{IamError, IamResult};

/// Creates and maintains roles over an injected store.
#[derive(Clone)]
pub struct RoleStore {
    store: Arc<dyn AccessStore>,
}

impl fmt::Debug for RoleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleStore").finish_non_exhaustive()
    }
}

impl RoleStore {
    /// Create a role store backed by `store`.
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Create a role. Fails with [`IamError::Conflict`] if the name is taken.
    pub fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &[PermissionRule],
    ) -> IamResult<RoleRecord> {
        let now = Utc::now();
        let record = RoleRecord {
            id: RoleId::new(Uuid::new_v4().to_string()),
            name: name.to_owned(),
            description: description.map(str::to_owned),
            permissions: encode(permissions)?,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_role(record.clone())?;

        info!(role_id = %record.id, name, rules = permissions.len(), "created role");
        Ok(record)
    }

    /// Replace the permissions of a role.
    pub fn update_permissions(&self, id: &RoleId, permissions: &[PermissionRule]) -> IamResult<()> {
        self.store
            .update_role_permissions(id, encode(permissions)?, Utc::now())?;

        info!(role_id = %id, rules = permissions.len(), "updated role permissions");
        Ok(())
    }

    /// Fetch a role.
    pub fn get_role(&self, id: &RoleId) -> IamResult<RoleRecord> {
        Ok(self.store.get_role(id)?)
    }

    /// Delete a role and every assignment that references it.
    pub fn delete_role(&self, id: &RoleId) -> IamResult<()> {
        self.store.delete_role(id)?;
        info!(role_id = %id, "deleted role");
        Ok(())
    }
}

fn encode(permissions: &[PermissionRule]) -> IamResult<String> {
    permission_document(permissions)
        .map_err(|e| IamError::Store(StoreError::Backend(e.to_string())))
}
