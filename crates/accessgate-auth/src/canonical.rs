//! String-to-sign construction.
//!
//! This module builds the deterministic serialization of a request's signable
//! attributes:
//!
//! ```text
//! HTTPRequestMethod\n
//! RequestPath\n
//! SortedQueryString\n
//! Timestamp\n
//! ContentHash
//! ```
//!
//! The method, path, and timestamp are taken verbatim. Query parameters are
//! sorted by key and rendered as `key=value` joined with `&`, without any
//! re-encoding. The content hash is `Base64(SHA256(body))`, or empty when the
//! body is empty. Header values are carried in [`SignatureParams`] but are
//! not part of the string to sign.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

/// The signable attributes of a request.
#[derive(Debug, Clone, Default)]
pub struct SignatureParams<'a> {
    /// HTTP method, verbatim.
    pub method: &'a str,
    /// Request path, verbatim.
    pub path: &'a str,
    /// Query parameters. The map keeps keys sorted.
    pub query_params: BTreeMap<String, String>,
    /// Request headers. Not part of the string to sign.
    pub headers: BTreeMap<String, String>,
    /// Timestamp string, verbatim.
    pub timestamp: &'a str,
    /// Request body.
    pub content: &'a [u8],
}

impl<'a> SignatureParams<'a> {
    /// Collect the signable attributes from HTTP request parts.
    ///
    /// Query parameters are decoded from the URI; for a repeated key the first
    /// value wins. Every header except the signature itself is carried along.
    #[must_use]
    pub fn from_parts(
        parts: &'a http::request::Parts,
        timestamp: &'a str,
        content: &'a [u8],
    ) -> Self {
        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| name.as_str() != crate::signer::HEADER_SIGNATURE)
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        Self {
            method: parts.method.as_str(),
            path: parts.uri.path(),
            query_params: parse_query_params(parts.uri.query().unwrap_or("")),
            headers,
            timestamp,
            content,
        }
    }
}

/// Build the string to sign from its components.
///
/// # Examples
///
/// ```
/// use accessgate_auth::canonical::{SignatureParams, build_string_to_sign};
///
/// let params = SignatureParams {
///     method: "GET",
///     path: "api/v1/users/42",
///     timestamp: "1700000000",
///     ..Default::default()
/// };
/// assert_eq!(build_string_to_sign(&params), "GET\napi/v1/users/42\n\n1700000000\n");
/// ```
#[must_use]
pub fn build_string_to_sign(params: &SignatureParams<'_>) -> String {
    let query = build_query_string(&params.query_params);
    let content_hash = hash_content(params.content);

    format!(
        "{}\n{}\n{query}\n{}\n{content_hash}",
        params.method, params.path, params.timestamp
    )
}

/// Render query parameters sorted by key as `k1=v1&k2=v2`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use accessgate_auth::canonical::build_query_string;
///
/// let params: BTreeMap<String, String> =
///     [("b".to_owned(), "2".to_owned()), ("a".to_owned(), "1".to_owned())].into();
/// assert_eq!(build_query_string(&params), "a=1&b=2");
/// ```
#[must_use]
pub fn build_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a raw URI query into a sorted map, keeping the first value of a
/// repeated key.
#[must_use]
pub fn parse_query_params(query: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Compute `Base64(SHA256(content))`, or an empty string for an empty body.
///
/// # Examples
///
/// ```
/// use accessgate_auth::canonical::hash_content;
///
/// assert_eq!(hash_content(b""), "");
/// assert_eq!(hash_content(b"abc"), "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=");
/// ```
#[must_use]
pub fn hash_content(content: &[u8]) -> String {
    if content.is_empty() {
        return String::new();
    }
    BASE64.encode(Sha256::digest(content))
}
