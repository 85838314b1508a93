//! Effective permission resolution and the allow/deny decision.
//!
//! A credential's effective permission set is the union of its own rules and
//! the rules of every assigned role, with identical `(resources, actions,
//! effect)` triples collapsed to one entry. The order of the resulting set
//! carries no meaning: [`evaluate`] gives the same answer for any order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use accessgate_core::{
    AccessStore, CredentialId, Effect, PermissionRule, parse_permission_document,
};
use tracing::debug;

use crate::error::{IamError, IamResult};

/// Decide whether `method` on `path` is permitted by `permissions`.
///
/// Rules with an unrecognized effect, or whose actions or resources do not
/// match, are skipped. A matching deny refuses immediately; otherwise the
/// request is permitted only if at least one allow matched. An empty set
/// refuses everything.
///
/// # Examples
///
/// ```
/// use accessgate_core::{Effect, PermissionRule};
/// use accessgate_iam::evaluate;
///
/// let rules = vec![
///     PermissionRule::new(["api/v1/users/*"], ["*"], Effect::Allow),
///     PermissionRule::new(["api/v1/users/admin"], ["DELETE"], Effect::Deny),
/// ];
/// assert!(evaluate(&rules, "GET", "/api/v1/users/42"));
/// assert!(!evaluate(&rules, "DELETE", "/api/v1/users/admin"));
/// assert!(!evaluate(&[], "GET", "/"));
/// ```
#[must_use]
pub fn evaluate(permissions: &[PermissionRule], method: &str, path: &str) -> bool {
    let mut allowed = false;

    for rule in permissions {
        let Some(effect) = rule.effect() else {
            continue;
        };
        if !rule.matches_action(method) || !rule.matches_resource(path) {
            continue;
        }

        match effect {
            Effect::Deny => {
                debug!(method, path, resources = ?rule.resources, "deny rule matched");
                return false;
            }
            Effect::Allow => allowed = true,
        }
    }

    allowed
}

/// Resolves effective permissions over an injected store.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn AccessStore>,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}

impl Authorizer {
    /// Create an authorizer backed by `store`.
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// The deduplicated union of a credential's own rules and the rules of
    /// all its roles.
    ///
    /// Fails with [`IamError::NotFound`] for an unknown credential and with
    /// [`IamError::CorruptPermissions`] if any stored document is unparsable.
    pub fn effective_permissions(&self, id: &CredentialId) -> IamResult<Vec<PermissionRule>> {
        let credential = self.store.get_credential(id)?;
        let roles = self.store.get_roles_for_credential(id)?;

        let mut seen = HashSet::new();
        let mut effective = Vec::new();
        let mut absorb = |rules: Vec<PermissionRule>| {
            for rule in rules {
                if seen.insert(rule.clone()) {
                    effective.push(rule);
                }
            }
        };

        absorb(parse(&credential.permissions, || format!("credential {id}"))?);
        for role in &roles {
            absorb(parse(&role.permissions, || format!("role {}", role.id))?);
        }

        debug!(
            credential_id = %id,
            roles = roles.len(),
            rules = effective.len(),
            "resolved permissions"
        );
        Ok(effective)
    }

    /// Resolve the credential's permissions and evaluate them for one request.
    pub fn is_allowed(&self, id: &CredentialId, method: &str, path: &str) -> IamResult<bool> {
        Ok(evaluate(&self.effective_permissions(id)?, method, path))
    }
}

fn parse(payload: &str, owner: impl FnOnce() -> String) -> IamResult<Vec<PermissionRule>> {
    parse_permission_document(payload).map_err(|source| IamError::CorruptPermissions {
        owner: owner(),
        source,
    })
}
