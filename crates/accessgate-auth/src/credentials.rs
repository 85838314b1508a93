//! The [`CredentialProvider`] seam between signature verification and
//! wherever credentials are stored.

use crate::error::AuthError;

/// Resolves the shared secret of a credential that may sign requests.
///
/// Closures of the shape `Fn(&str) -> Result<String, AuthError>` are
/// providers too, which is handy for fixed secrets on the client side.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret for the given credential id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialNotFound`] if the id is not recognized,
    /// [`AuthError::CredentialInactive`] if the credential may not sign
    /// requests, or [`AuthError::Store`] if the lookup itself failed.
    fn get_secret_key(&self, credential_id: &str) -> Result<String, AuthError>;
}

impl<F> CredentialProvider for F
where
    F: Fn(&str) -> Result<String, AuthError> + Send + Sync,
{
    fn get_secret_key(&self, credential_id: &str) -> Result<String, AuthError> {
        self(credential_id)
    }
}
