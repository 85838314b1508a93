//! The per-request authorization pipeline.
//!
//! Every inbound request walks the same stages:
//!
//! ```text
//! Received -> SignatureChecked -> CredentialChecked -> PermissionsResolved -> Authorized
//!     |              |                    |                     |
//!     +-- 401        +-- 401              +-- 500               +-- 403
//! ```
//!
//! Each request is decided from fresh store state; nothing is cached between
//! requests.

use std::fmt;
use std::sync::Arc;

use accessgate_auth::{SignedFields, TimestampPolicy, verify_fields};
use accessgate_core::{AccessStore, CredentialId};
use http::StatusCode;
use tracing::{debug, error, warn};

use crate::authorizer::{Authorizer, evaluate};
use crate::credentials::CredentialStore;

/// Position of a request in the gate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    /// The request has arrived; nothing is checked yet.
    Received,
    /// The signature matches the stored secret.
    SignatureChecked,
    /// The credential is active.
    CredentialChecked,
    /// The effective permission set is loaded.
    PermissionsResolved,
}

/// Why the gate refused a request.
///
/// Display output is the generic body returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Transport fields are missing or the signature does not verify.
    #[error("Invalid signature")]
    InvalidSignature,
    /// The credential is unknown or not active.
    #[error("Invalid access key")]
    InvalidAccessKey,
    /// Permission resolution failed on the server side.
    #[error("Error getting permissions")]
    PermissionLookupFailed,
    /// The policy does not permit the request.
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl Rejection {
    /// HTTP status for this rejection.
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidSignature | Self::InvalidAccessKey => StatusCode::UNAUTHORIZED,
            Self::PermissionLookupFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }

    /// The last stage the request reached before being refused.
    #[must_use]
    pub fn stage(self) -> GateStage {
        match self {
            Self::InvalidSignature => GateStage::Received,
            Self::InvalidAccessKey => GateStage::SignatureChecked,
            Self::PermissionLookupFailed => GateStage::CredentialChecked,
            Self::InsufficientPermissions => GateStage::PermissionsResolved,
        }
    }
}

/// A request that passed every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    /// The credential that signed the request.
    pub credential_id: CredentialId,
}

/// Signature verification, credential validation, and policy evaluation for
/// one request at a time.
#[derive(Clone)]
pub struct RequestGate {
    credentials: CredentialStore,
    authorizer: Authorizer,
    policy: TimestampPolicy,
}

impl fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGate")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RequestGate {
    /// Create a gate over `store` with the given timestamp policy.
    pub fn new(store: Arc<dyn AccessStore>, policy: TimestampPolicy) -> Self {
        Self {
            credentials: CredentialStore::new(Arc::clone(&store)),
            authorizer: Authorizer::new(store),
            policy,
        }
    }

    /// Decide a request from its head and its complete body.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] of the first stage that fails.
    pub fn check(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<Authorized, Rejection> {
        let method = parts.method.as_str();
        let path = parts.uri.path();

        // Received
        let fields = SignedFields::from_parts(parts).map_err(|e| {
            warn!(method, path, error = %e, "rejecting unsigned request");
            Rejection::InvalidSignature
        })?;
        let credential_id = CredentialId::new(fields.credential_id.as_str());

        match verify_fields(&fields, parts, body, &self.credentials, &self.policy) {
            Ok(true) => {}
            Ok(false) => {
                warn!(%credential_id, method, path, "signature verification failed");
                return Err(Rejection::InvalidSignature);
            }
            Err(e) => {
                warn!(%credential_id, method, path, error = %e, "signature verification error");
                return Err(Rejection::InvalidSignature);
            }
        }
        debug!(%credential_id, stage = ?GateStage::SignatureChecked, "gate advanced");

        match self.credentials.validate_credential(&credential_id) {
            Ok(true) => {}
            Ok(false) => {
                warn!(%credential_id, "credential is not active");
                return Err(Rejection::InvalidAccessKey);
            }
            Err(e) => {
                error!(%credential_id, error = %e, "credential validation failed");
                return Err(Rejection::InvalidAccessKey);
            }
        }
        debug!(%credential_id, stage = ?GateStage::CredentialChecked, "gate advanced");

        let permissions = self
            .authorizer
            .effective_permissions(&credential_id)
            .map_err(|e| {
                error!(%credential_id, error = %e, "failed to resolve permissions");
                Rejection::PermissionLookupFailed
            })?;
        debug!(
            %credential_id,
            stage = ?GateStage::PermissionsResolved,
            rules = permissions.len(),
            "gate advanced"
        );

        if !evaluate(&permissions, method, path) {
            warn!(%credential_id, method, path, "insufficient permissions");
            return Err(Rejection::InsufficientPermissions);
        }

        debug!(%credential_id, method, path, "request authorized");
        Ok(Authorized { credential_id })
    }
}
