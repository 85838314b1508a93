//! Error types for request signing and verification.
//!
//! All signing and verification failures are represented by [`AuthError`].
//! Missing transport headers are errors; an unknown or inactive credential
//! is reported by the provider and turned into a plain `false` by
//! [`verify_request`](crate::verify_request).

/// Errors that can occur while signing or verifying a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required transport header is absent or empty.
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// A transport header is present but not usable.
    #[error("Invalid header value: {0}")]
    InvalidHeader(&'static str),

    /// The credential id is not known to the provider.
    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    /// The credential exists but may not sign requests.
    #[error("Credential is not active: {0}")]
    CredentialInactive(String),

    /// The signed timestamp lies outside the accepted clock skew.
    #[error("Request timestamp is outside the accepted window")]
    RequestExpired,

    /// The credential provider could not be consulted.
    #[error("Credential lookup failed: {0}")]
    Store(String),
}
