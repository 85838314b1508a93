//! Credential and role management, policy evaluation, and the request gate.
//!
//! The components share one injected [`AccessStore`](accessgate_core::AccessStore)
//! handle:
//!
//! - [`CredentialStore`] - issue, validate, and manage credentials and their
//!   role assignments; also the [`CredentialProvider`](accessgate_auth::CredentialProvider)
//!   that resolves secrets for signature verification
//! - [`RoleStore`] - named permission bundles
//! - [`Authorizer`] - effective permission resolution and the allow/deny
//!   decision ([`evaluate`])
//! - [`RequestGate`] - the per-request pipeline from signature check to
//!   authorization
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use accessgate_auth::{TimestampPolicy, sign_request};
//! use accessgate_core::{Effect, MemoryStore, PermissionRule};
//! use accessgate_iam::{CredentialStore, RequestGate};
//!
//! let store = Arc::new(MemoryStore::new());
//! let credentials = CredentialStore::new(store.clone());
//! let key = credentials
//!     .create_credential("7", &[PermissionRule::new(["api/v1/users/*"], ["GET"], Effect::Allow)])
//!     .unwrap();
//!
//! let mut req = http::Request::builder()
//!     .uri("http://localhost/api/v1/users/42")
//!     .body(())
//!     .unwrap();
//! sign_request(&mut req, key.access_key_id.as_str(), &key.secret, b"").unwrap();
//!
//! let gate = RequestGate::new(store, TimestampPolicy::permissive());
//! let (parts, ()) = req.into_parts();
//! assert!(gate.check(&parts, b"").is_ok());
//! ```

mod authorizer;
mod credentials;
mod error;
mod gate;
mod keys;
mod roles;

#[cfg(test)]
mod testing;

pub use authorizer::{Authorizer, evaluate};
pub use credentials::CredentialStore;
pub use error::{IamError, IamResult};
pub use gate::{Authorized, GateStage, Rejection, RequestGate};
pub use keys::{KeyPair, generate_key_pair};
pub use roles::RoleStore;
