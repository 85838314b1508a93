//! Store wrappers that inject failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use accessgate_core::{
    AccessStore, CredentialId, CredentialRecord, CredentialStatus, MemoryStore, RoleId,
    RoleRecord, StoreError, StoreResult,
};
use chrono::{DateTime, Utc};

/// A [`MemoryStore`] whose individual operations can be switched to fail.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    pub(crate) fail_last_used: AtomicBool,
    pub(crate) fail_role_lookup: AtomicBool,
    pub(crate) fail_credential_lookup: AtomicBool,
    /// Once set, fail every credential lookup after the next one.
    pub(crate) fail_repeated_credential_lookup: AtomicBool,
    /// Deactivate a credential right after it has been looked up.
    pub(crate) revoke_after_lookup: AtomicBool,
    credential_lookups: AtomicUsize,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, op: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Backend(format!("{op} unavailable")))
        } else {
            Ok(())
        }
    }
}

impl AccessStore for FlakyStore {
    fn get_credential(&self, id: &CredentialId) -> StoreResult<CredentialRecord> {
        Self::check(&self.fail_credential_lookup, "get_credential")?;
        if self.fail_repeated_credential_lookup.load(Ordering::SeqCst)
            && self.credential_lookups.fetch_add(1, Ordering::SeqCst) > 0
        {
            return Err(StoreError::Backend("get_credential unavailable".to_owned()));
        }

        let record = self.inner.get_credential(id)?;
        if self.revoke_after_lookup.load(Ordering::SeqCst) {
            self.inner.update_status(id, CredentialStatus::Inactive)?;
        }
        Ok(record)
    }

    fn insert_credential(&self, record: CredentialRecord) -> StoreResult<()> {
        self.inner.insert_credential(record)
    }

    fn list_credentials_for_subject(
        &self,
        subject_id: &str,
    ) -> StoreResult<Vec<CredentialRecord>> {
        self.inner.list_credentials_for_subject(subject_id)
    }

    fn update_status(&self, id: &CredentialId, status: CredentialStatus) -> StoreResult<()> {
        self.inner.update_status(id, status)
    }

    fn update_last_used(&self, id: &CredentialId, at: DateTime<Utc>) -> StoreResult<()> {
        Self::check(&self.fail_last_used, "update_last_used")?;
        self.inner.update_last_used(id, at)
    }

    fn get_role(&self, id: &RoleId) -> StoreResult<RoleRecord> {
        self.inner.get_role(id)
    }

    fn insert_role(&self, record: RoleRecord) -> StoreResult<()> {
        self.inner.insert_role(record)
    }

    fn update_role_permissions(
        &self,
        id: &RoleId,
        permissions: String,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.update_role_permissions(id, permissions, at)
    }

    fn delete_role(&self, id: &RoleId) -> StoreResult<()> {
        self.inner.delete_role(id)
    }

    fn get_roles_for_credential(&self, id: &CredentialId) -> StoreResult<Vec<RoleRecord>> {
        Self::check(&self.fail_role_lookup, "get_roles_for_credential")?;
        self.inner.get_roles_for_credential(id)
    }

    fn insert_assignment(
        &self,
        credential_id: &CredentialId,
        role_id: &RoleId,
    ) -> StoreResult<()> {
        self.inner.insert_assignment(credential_id, role_id)
    }

    fn delete_assignment(
        &self,
        credential_id: &CredentialId,
        role_id: &RoleId,
    ) -> StoreResult<bool> {
        self.inner.delete_assignment(credential_id, role_id)
    }
}
