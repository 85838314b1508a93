//! Storage seam for credentials, roles, and their assignments.
//!
//! [`AccessStore`] is the only contract the gate needs from persistence:
//! point lookups and point writes with per-row atomicity. Permission payloads
//! are stored as raw JSON documents and parsed by the caller, so a corrupt
//! payload surfaces as a parse error instead of an empty rule set.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::types::{CredentialId, CredentialStatus, RoleId};

/// A persisted credential.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Unique credential id.
    pub id: CredentialId,
    /// Shared HMAC secret (standard base64 of random bytes).
    pub secret: String,
    /// Subject (user/account) that owns the credential.
    pub subject_id: String,
    /// Lifecycle status.
    pub status: CredentialStatus,
    /// JSON permission document attached directly to the credential.
    pub permissions: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful validation, if any.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Hard expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Whether the credential may be used at `now`: status is active and the
    /// expiry, if set, lies in the future.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CredentialStatus::Active && self.expires_at.is_none_or(|at| at > now)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("secret", &"***")
            .field("subject_id", &self.subject_id)
            .field("status", &self.status)
            .field("permissions", &self.permissions)
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A persisted role: a named, reusable permission bundle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    /// Unique role id.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// JSON permission document carried by the role.
    pub permissions: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Point-lookup and point-write access to credentials, roles, and
/// credential/role assignments.
///
/// Implementations must tolerate concurrent readers and concurrent
/// single-row writers. No operation spans a multi-row transaction.
pub trait AccessStore: Send + Sync {
    /// Fetch a credential by id.
    ///
    /// Returns [`StoreError::CredentialNotFound`](crate::StoreError::CredentialNotFound)
    /// when the id is unknown.
    fn get_credential(&self, id: &CredentialId) -> StoreResult<CredentialRecord>;

    /// Persist a new credential.
    fn insert_credential(&self, record: CredentialRecord) -> StoreResult<()>;

    /// All credentials owned by a subject.
    fn list_credentials_for_subject(&self, subject_id: &str) -> StoreResult<Vec<CredentialRecord>>;

    /// Change the lifecycle status of a credential.
    fn update_status(&self, id: &CredentialId, status: CredentialStatus) -> StoreResult<()>;

    /// Record the time a credential was last used.
    fn update_last_used(&self, id: &CredentialId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Fetch a role by id.
    fn get_role(&self, id: &RoleId) -> StoreResult<RoleRecord>;

    /// Persist a new role. The role name must be unique.
    fn insert_role(&self, record: RoleRecord) -> StoreResult<()>;

    /// Replace the permission document of a role.
    fn update_role_permissions(
        &self,
        id: &RoleId,
        permissions: String,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Remove a role together with every assignment referencing it.
    fn delete_role(&self, id: &RoleId) -> StoreResult<()>;

    /// Every role assigned to a credential.
    fn get_roles_for_credential(&self, id: &CredentialId) -> StoreResult<Vec<RoleRecord>>;

    /// Link a role to a credential. Fails if the pair already exists or
    /// either side is missing.
    fn insert_assignment(&self, credential_id: &CredentialId, role_id: &RoleId) -> StoreResult<()>;

    /// Unlink a role from a credential. Returns whether a link was removed.
    fn delete_assignment(&self, credential_id: &CredentialId, role_id: &RoleId)
    -> StoreResult<bool>;
}
