//! HMAC-SHA256 request signing and verification for AccessGate.
//!
//! A signed request carries three transport headers next to its own method,
//! path, query, and body:
//!
//! - `X-Access-Key-ID` - the credential id
//! - `X-Timestamp` - seconds since the Unix epoch, as a string
//! - `X-Signature` - `Base64(HMAC-SHA256(secret, StringToSign))`
//!
//! where the string to sign is built by [`canonical::build_string_to_sign`]:
//!
//! ```text
//! Method\n
//! Path\n
//! SortedQuery\n
//! Timestamp\n
//! Base64(SHA256(Body))
//! ```
//!
//! # Usage
//!
//! ```rust
//! use accessgate_auth::{AuthError, TimestampPolicy, sign_request, verify_request};
//!
//! let provider = |id: &str| -> Result<String, AuthError> {
//!     match id {
//!         "K1" => Ok("S1".to_owned()),
//!         other => Err(AuthError::CredentialNotFound(other.to_owned())),
//!     }
//! };
//!
//! let mut req = http::Request::builder()
//!     .method("GET")
//!     .uri("http://localhost/api/v1/users/42")
//!     .body(())
//!     .unwrap();
//! sign_request(&mut req, "K1", "S1", b"").unwrap();
//!
//! let (parts, ()) = req.into_parts();
//! let valid = verify_request(&parts, b"", &provider, &TimestampPolicy::permissive()).unwrap();
//! assert!(valid);
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - String-to-sign construction
//! - [`credentials`] - Credential provider trait
//! - [`error`] - Authentication error types
//! - [`signer`] - Signing, transport headers, and verification

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod signer;

pub use canonical::{SignatureParams, build_string_to_sign, hash_content};
pub use credentials::CredentialProvider;
pub use error::AuthError;
pub use signer::{
    HEADER_ACCESS_KEY_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP, SignedFields, TimestampPolicy,
    compute_signature, sign_request, sign_request_at, verify_fields, verify_request,
};
