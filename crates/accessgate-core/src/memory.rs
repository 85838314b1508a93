//! Concurrent in-memory [`AccessStore`].
//!
//! [`MemoryStore`] keeps every table in a `DashMap`, so lookups and
//! single-row updates are sharded rather than serialized behind one lock.
//! Role names are indexed separately to enforce uniqueness atomically.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{AccessStore, CredentialRecord, RoleRecord};
use crate::types::{CredentialId, CredentialStatus, RoleId};

/// Thread-safe, in-memory credential and role store.
///
/// # Examples
///
/// ```
/// use accessgate_core::{AccessStore, CredentialId, MemoryStore};
///
/// let store = MemoryStore::new();
/// assert!(store.get_credential(&CredentialId::new("missing")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: DashMap<CredentialId, CredentialRecord>,
    roles: DashMap<RoleId, RoleRecord>,
    role_names: DashMap<String, RoleId>,
    assignments: DashMap<CredentialId, BTreeSet<RoleId>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    #[must_use]
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Number of stored roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

impl AccessStore for MemoryStore {
    fn get_credential(&self, id: &CredentialId) -> StoreResult<CredentialRecord> {
        self.credentials
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::CredentialNotFound(id.clone()))
    }

    fn insert_credential(&self, record: CredentialRecord) -> StoreResult<()> {
        match self.credentials.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::CredentialExists(record.id)),
            Entry::Vacant(slot) => {
                debug!(credential_id = %record.id, "stored credential");
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn list_credentials_for_subject(&self, subject_id: &str) -> StoreResult<Vec<CredentialRecord>> {
        let mut records: Vec<CredentialRecord> = self
            .credentials
            .iter()
            .filter(|entry| entry.subject_id == subject_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    fn update_status(&self, id: &CredentialId, status: CredentialStatus) -> StoreResult<()> {
        let mut entry = self
            .credentials
            .get_mut(id)
            .ok_or_else(|| StoreError::CredentialNotFound(id.clone()))?;
        entry.status = status;
        Ok(())
    }

    fn update_last_used(&self, id: &CredentialId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut entry = self
            .credentials
            .get_mut(id)
            .ok_or_else(|| StoreError::CredentialNotFound(id.clone()))?;
        entry.last_used_at = Some(at);
        Ok(())
    }

    fn get_role(&self, id: &RoleId) -> StoreResult<RoleRecord> {
        self.roles
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::RoleNotFound(id.clone()))
    }

    fn insert_role(&self, record: RoleRecord) -> StoreResult<()> {
        if self.roles.contains_key(&record.id) {
            return Err(StoreError::Backend(format!(
                "role id already exists: {}",
                record.id
            )));
        }

        match self.role_names.entry(record.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateRoleName(record.name)),
            Entry::Vacant(slot) => {
                slot.insert(record.id.clone());
                debug!(role_id = %record.id, name = %record.name, "stored role");
                self.roles.insert(record.id.clone(), record);
                Ok(())
            }
        }
    }

    fn update_role_permissions(
        &self,
        id: &RoleId,
        permissions: String,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut entry = self
            .roles
            .get_mut(id)
            .ok_or_else(|| StoreError::RoleNotFound(id.clone()))?;
        entry.permissions = permissions;
        entry.updated_at = at;
        Ok(())
    }

    fn delete_role(&self, id: &RoleId) -> StoreResult<()> {
        let (_, role) = self
            .roles
            .remove(id)
            .ok_or_else(|| StoreError::RoleNotFound(id.clone()))?;
        self.role_names.remove(&role.name);

        for mut assigned in self.assignments.iter_mut() {
            assigned.value_mut().remove(id);
        }

        debug!(role_id = %id, "deleted role and its assignments");
        Ok(())
    }

    fn get_roles_for_credential(&self, id: &CredentialId) -> StoreResult<Vec<RoleRecord>> {
        // Copy the ids out first so no assignment guard is held while reading roles.
        let role_ids: Vec<RoleId> = self
            .assignments
            .get(id)
            .map(|assigned| assigned.iter().cloned().collect())
            .unwrap_or_default();

        Ok(role_ids
            .iter()
            .filter_map(|role_id| self.roles.get(role_id).map(|role| role.value().clone()))
            .collect())
    }

    fn insert_assignment(&self, credential_id: &CredentialId, role_id: &RoleId) -> StoreResult<()> {
        if !self.credentials.contains_key(credential_id) {
            return Err(StoreError::CredentialNotFound(credential_id.clone()));
        }
        if !self.roles.contains_key(role_id) {
            return Err(StoreError::RoleNotFound(role_id.clone()));
        }

        let mut assigned = self.assignments.entry(credential_id.clone()).or_default();
        if assigned.insert(role_id.clone()) {
            Ok(())
        } else {
            Err(StoreError::AssignmentExists {
                credential_id: credential_id.clone(),
                role_id: role_id.clone(),
            })
        }
    }

    fn delete_assignment(
        &self,
        credential_id: &CredentialId,
        role_id: &RoleId,
    ) -> StoreResult<bool> {
        Ok(self
            .assignments
            .get_mut(credential_id)
            .is_some_and(|mut assigned| assigned.remove(role_id)))
    }
}
