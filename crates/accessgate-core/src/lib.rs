//! Core types, permission rules, configuration, and storage for AccessGate.
//!
//! This crate provides the building blocks shared by the signer, the
//! authorizer, and the request gate:
//!
//! - [`CredentialId`], [`RoleId`], and [`CredentialStatus`] identifiers
//! - [`PermissionRule`] and its persisted JSON document format
//! - [`AccessStore`], the point-lookup/point-write storage seam, together
//!   with the concurrent in-memory [`MemoryStore`]
//! - [`GateConfig`], the environment-driven configuration

mod config;
mod error;
mod memory;
mod permission;
mod store;
mod types;

pub use config::{GateConfig, SeedCredential};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use permission::{Effect, PermissionRule, parse_permission_document, permission_document};
pub use store::{AccessStore, CredentialRecord, RoleRecord};
pub use types::{CredentialId, CredentialStatus, RoleId};
