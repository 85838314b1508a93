//! IAM error types.

use accessgate_core::StoreError;

/// Errors from credential, role, and permission operations.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// The addressed credential, role, or assignment does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation collides with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored permission document could not be parsed.
    #[error("corrupt permission document on {owner}")]
    CorruptPermissions {
        /// The credential or role carrying the document.
        owner: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The backing store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for IamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CredentialNotFound(id) => Self::NotFound(format!("credential {id}")),
            StoreError::RoleNotFound(id) => Self::NotFound(format!("role {id}")),
            e @ (StoreError::CredentialExists(_)
            | StoreError::DuplicateRoleName(_)
            | StoreError::AssignmentExists { .. }) => Self::Conflict(e.to_string()),
            e @ StoreError::Backend(_) => Self::Store(e),
        }
    }
}

/// Convenience result type for IAM operations.
pub type IamResult<T> = Result<T, IamError>;
