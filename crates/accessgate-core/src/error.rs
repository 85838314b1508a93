//! Error types for credential and role storage.

use crate::types::{CredentialId, RoleId};

/// Errors surfaced by an [`AccessStore`](crate::AccessStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No credential with the given id exists.
    #[error("credential not found: {0}")]
    CredentialNotFound(CredentialId),

    /// A credential with the given id already exists.
    #[error("credential already exists: {0}")]
    CredentialExists(CredentialId),

    /// No role with the given id exists.
    #[error("role not found: {0}")]
    RoleNotFound(RoleId),

    /// Another role already uses this name.
    #[error("role name already in use: {0}")]
    DuplicateRoleName(String),

    /// The credential already has this role assigned.
    #[error("role {role_id} is already assigned to credential {credential_id}")]
    AssignmentExists {
        /// The credential side of the assignment.
        credential_id: CredentialId,
        /// The role side of the assignment.
        role_id: RoleId,
    },

    /// The backing store could not complete the operation.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error means the addressed row does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CredentialNotFound(_) | Self::RoleNotFound(_))
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
