//! Credential lifecycle and role assignment.

use std::fmt;
use std::sync::Arc;

use accessgate_auth::{AuthError, CredentialProvider};
use accessgate_core::{
    AccessStore, CredentialId, CredentialRecord, CredentialStatus, PermissionRule, RoleId,
    StoreError, permission_document,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{IamError, IamResult};
use crate::keys::{KeyPair, generate_key_pair};

/// Issues, validates, and manages credentials over an injected store.
///
/// Also serves as the [`CredentialProvider`] for signature verification:
/// only credentials that are active at lookup time resolve to a secret.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn AccessStore>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create a credential store backed by `store`.
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Issue a new active credential for `subject_id` with a freshly
    /// generated id and secret.
    pub fn create_credential(
        &self,
        subject_id: &str,
        permissions: &[PermissionRule],
    ) -> IamResult<KeyPair> {
        self.import_credential(generate_key_pair(), subject_id, permissions, None)
    }

    /// Persist an active credential with a caller-supplied id and secret.
    ///
    /// Fails with [`IamError::Conflict`] if the id is already taken.
    pub fn import_credential(
        &self,
        key_pair: KeyPair,
        subject_id: &str,
        permissions: &[PermissionRule],
        expires_at: Option<DateTime<Utc>>,
    ) -> IamResult<KeyPair> {
        let document = permission_document(permissions)
            .map_err(|e| IamError::Store(StoreError::Backend(e.to_string())))?;

        let record = CredentialRecord {
            id: key_pair.access_key_id.clone(),
            secret: key_pair.secret.clone(),
            subject_id: subject_id.to_owned(),
            status: CredentialStatus::Active,
            permissions: document,
            created_at: Utc::now(),
            last_used_at: None,
            expires_at,
        };
        self.store.insert_credential(record)?;

        info!(
            credential_id = %key_pair.access_key_id,
            subject_id,
            rules = permissions.len(),
            "created credential"
        );
        Ok(key_pair)
    }

    /// Fetch a credential record.
    pub fn get_credential(&self, id: &CredentialId) -> IamResult<CredentialRecord> {
        Ok(self.store.get_credential(id)?)
    }

    /// Whether a credential may currently be used.
    ///
    /// An unknown id yields `Ok(false)`. Every lookup of an existing
    /// credential refreshes its last-used time; that update is best effort
    /// and never changes the result.
    pub fn validate_credential(&self, id: &CredentialId) -> IamResult<bool> {
        let record = match self.store.get_credential(id) {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                debug!(credential_id = %id, "unknown credential");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        if let Err(e) = self.store.update_last_used(id, now) {
            warn!(credential_id = %id, error = %e, "failed to record credential usage");
        }

        let active = record.is_active_at(now);
        debug!(credential_id = %id, status = %record.status, active, "validated credential");
        Ok(active)
    }

    /// Move a credential to another lifecycle status.
    pub fn set_status(&self, id: &CredentialId, status: CredentialStatus) -> IamResult<()> {
        self.store.update_status(id, status)?;
        info!(credential_id = %id, %status, "changed credential status");
        Ok(())
    }

    /// All credentials owned by a subject.
    pub fn list_for_subject(&self, subject_id: &str) -> IamResult<Vec<CredentialRecord>> {
        Ok(self.store.list_credentials_for_subject(subject_id)?)
    }

    /// Attach a role to a credential.
    ///
    /// Fails with [`IamError::NotFound`] if either side is missing and with
    /// [`IamError::Conflict`] if the role is already assigned.
    pub fn assign_role(&self, credential_id: &CredentialId, role_id: &RoleId) -> IamResult<()> {
        self.store.get_credential(credential_id)?;
        self.store.get_role(role_id)?;
        self.store.insert_assignment(credential_id, role_id)?;

        info!(%credential_id, %role_id, "assigned role");
        Ok(())
    }

    /// Detach a role from a credential.
    ///
    /// Fails with [`IamError::NotFound`] if the role was not assigned.
    pub fn revoke_role(&self, credential_id: &CredentialId, role_id: &RoleId) -> IamResult<()> {
        if !self.store.delete_assignment(credential_id, role_id)? {
            return Err(IamError::NotFound(format!(
                "assignment of role {role_id} to credential {credential_id}"
            )));
        }

        info!(%credential_id, %role_id, "revoked role");
        Ok(())
    }
}

impl CredentialProvider for CredentialStore {
    fn get_secret_key(&self, credential_id: &str) -> Result<String, AuthError> {
        match self.store.get_credential(&CredentialId::new(credential_id)) {
            Ok(record) if record.is_active_at(Utc::now()) => Ok(record.secret),
            Ok(_) => Err(AuthError::CredentialInactive(credential_id.to_owned())),
            Err(e) if e.is_not_found() => {
                Err(AuthError::CredentialNotFound(credential_id.to_owned()))
            }
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }
}
