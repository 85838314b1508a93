//! Permission rules and their persisted JSON document format.
//!
//! A permission document is the JSON payload stored alongside a credential or
//! a role. It is either an array of rules or a single rule object:
//!
//! ```json
//! [{"resources": ["api/v1/users/*"], "actions": ["GET"], "effect": "allow"}]
//! ```
//!
//! The `effect` field is kept verbatim. An effect other than `allow`/`deny`
//! parses successfully and is ignored at evaluation time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Action token that matches every HTTP method.
const ANY_ACTION: &str = "*";

/// Suffix that turns a resource pattern into a prefix pattern.
const PREFIX_WILDCARD: &str = "/*";

/// The decision a matching rule contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Grant access unless a matching deny exists.
    Allow,
    /// Refuse access regardless of any allow.
    Deny,
}

impl Effect {
    /// Parse an effect token case-insensitively. Returns `None` for anything
    /// other than `allow` or `deny`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("allow") {
            Some(Self::Allow)
        } else if token.eq_ignore_ascii_case("deny") {
            Some(Self::Deny)
        } else {
            None
        }
    }

    /// Wire form of the effect.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One allow/deny clause over resource path patterns and HTTP action tokens.
///
/// Equality and hashing cover the `(resources, actions, effect)` triple, which
/// is the deduplication key for effective permission sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRule {
    /// Exact paths, or prefix patterns ending in `/*`.
    #[serde(default)]
    pub resources: Vec<String>,
    /// HTTP method tokens, or `*` for any method.
    #[serde(default)]
    pub actions: Vec<String>,
    /// `allow` or `deny`, compared case-insensitively.
    #[serde(default)]
    pub effect: String,
}

impl PermissionRule {
    /// Build a rule from resource patterns, action tokens, and an effect.
    pub fn new<R, A>(resources: R, actions: A, effect: Effect) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
            effect: effect.as_str().to_owned(),
        }
    }

    /// The parsed effect, or `None` when the stored token is unrecognized.
    #[must_use]
    pub fn effect(&self) -> Option<Effect> {
        Effect::parse(&self.effect)
    }

    /// Whether any action token matches `method` (case-insensitive, `*` wildcard).
    #[must_use]
    pub fn matches_action(&self, method: &str) -> bool {
        self.actions
            .iter()
            .any(|action| action == ANY_ACTION || action.eq_ignore_ascii_case(method))
    }

    /// Whether any resource pattern matches `path`.
    #[must_use]
    pub fn matches_resource(&self, path: &str) -> bool {
        self.resources
            .iter()
            .any(|pattern| match_path_pattern(pattern, path))
    }
}

/// Match a request path against an exact or `/*`-suffixed prefix pattern.
///
/// A single leading `/` is ignored on both sides so that `api/v1/users` and
/// the HTTP form `/api/v1/users` address the same resource. A prefix pattern
/// matches its base path and anything below it at a segment boundary:
/// `api/v1/users/*` matches `api/v1/users/42` but not `api/v1/usersx`. The
/// root pattern `/*` has an empty base and matches every path.
fn match_path_pattern(pattern: &str, path: &str) -> bool {
    let path = path.strip_prefix('/').unwrap_or(path);

    // The suffix is checked before normalising, otherwise `/*` collapses to `*`.
    match pattern.strip_suffix(PREFIX_WILDCARD) {
        Some(base) => {
            let base = base.strip_prefix('/').unwrap_or(base);
            base.is_empty()
                || path == base
                || path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => pattern.strip_prefix('/').unwrap_or(pattern) == path,
    }
}

/// On-disk shape of a permission payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum PermissionDocument {
    Many(Vec<PermissionRule>),
    One(PermissionRule),
}

/// Parse a persisted permission payload.
///
/// An empty payload or JSON `null` means "no rules". Anything else must be a
/// rule object or an array of rule objects.
///
/// # Examples
///
/// ```
/// use accessgate_core::parse_permission_document;
///
/// let rules = parse_permission_document(
///     r#"{"resources":["api/v1/products/read"],"actions":["GET"],"effect":"allow"}"#,
/// )
/// .unwrap();
/// assert_eq!(rules.len(), 1);
/// assert!(parse_permission_document("").unwrap().is_empty());
/// assert!(parse_permission_document("{not json").is_err());
/// ```
pub fn parse_permission_document(payload: &str) -> Result<Vec<PermissionRule>, serde_json::Error> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Option<PermissionDocument> = serde_json::from_str(payload)?;
    Ok(match document {
        None => Vec::new(),
        Some(PermissionDocument::Many(rules)) => rules,
        Some(PermissionDocument::One(rule)) => vec![rule],
    })
}

/// Serialize rules into the persisted permission payload (a JSON array).
pub fn permission_document(rules: &[PermissionRule]) -> Result<String, serde_json::Error> {
    serde_json::to_string(rules)
}
