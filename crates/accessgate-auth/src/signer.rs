//! Request signing and signature verification.
//!
//! Signing:
//!
//! 1. Stamp the current epoch-seconds timestamp.
//! 2. Build the string to sign from method, path, sorted query, timestamp,
//!    and body hash.
//! 3. Compute `Base64(HMAC-SHA256(secret, string_to_sign))`.
//! 4. Attach credential id, timestamp, and signature as transport headers.
//!
//! Verification re-derives the string to sign from the received request,
//! resolves the stored secret of the claimed credential, and compares the
//! signatures in constant time. The main entry point is [`verify_request`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderValue;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{SignatureParams, build_string_to_sign, parse_query_params};
use crate::credentials::CredentialProvider;
use crate::error::AuthError;

/// Transport header carrying the credential id.
pub const HEADER_ACCESS_KEY_ID: &str = "x-access-key-id";

/// Transport header carrying the signing timestamp (epoch seconds).
pub const HEADER_TIMESTAMP: &str = "x-timestamp";

/// Transport header carrying the base64 signature.
pub const HEADER_SIGNATURE: &str = "x-signature";

type HmacSha256 = Hmac<Sha256>;

/// The three transport fields every signed request must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedFields {
    /// The claimed credential id.
    pub credential_id: String,
    /// The signing timestamp, verbatim.
    pub timestamp: String,
    /// The presented base64 signature.
    pub signature: String,
}

impl SignedFields {
    /// Extract the transport fields from request headers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] naming the first absent or empty
    /// field, or [`AuthError::InvalidHeader`] if a value is not visible ASCII.
    pub fn from_parts(parts: &http::request::Parts) -> Result<Self, AuthError> {
        Ok(Self {
            credential_id: required_header(parts, HEADER_ACCESS_KEY_ID)?,
            timestamp: required_header(parts, HEADER_TIMESTAMP)?,
            signature: required_header(parts, HEADER_SIGNATURE)?,
        })
    }
}

/// Freshness policy for the signed timestamp.
///
/// The permissive policy accepts any timestamp string, matching the
/// behavior of clients that do not keep their clocks in sync. A bounded
/// policy requires an integer timestamp within `max_skew_secs` of the
/// server clock in either direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampPolicy {
    max_skew_secs: Option<u64>,
}

impl TimestampPolicy {
    /// Accept any timestamp.
    #[must_use]
    pub fn permissive() -> Self {
        Self { max_skew_secs: None }
    }

    /// Accept timestamps within `secs` of now. Zero means permissive.
    #[must_use]
    pub fn with_max_skew(secs: u64) -> Self {
        Self {
            max_skew_secs: (secs > 0).then_some(secs),
        }
    }

    /// The configured window, if bounded.
    #[must_use]
    pub fn max_skew_secs(&self) -> Option<u64> {
        self.max_skew_secs
    }

    /// Check a timestamp against the policy at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeader`] if the policy is bounded and the
    /// timestamp is not an integer, or [`AuthError::RequestExpired`] if it
    /// lies outside the window.
    pub fn check(&self, timestamp: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let Some(max_skew) = self.max_skew_secs else {
            return Ok(());
        };

        let signed_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| AuthError::InvalidHeader(HEADER_TIMESTAMP))?;

        if now.timestamp().abs_diff(signed_at) > max_skew {
            debug!(
                signed_at,
                now = now.timestamp(),
                max_skew,
                "timestamp outside window"
            );
            return Err(AuthError::RequestExpired);
        }

        Ok(())
    }
}

/// Compute `Base64(HMAC-SHA256(secret, string_to_sign))`.
///
/// # Examples
///
/// ```
/// use accessgate_auth::compute_signature;
///
/// let sig = compute_signature("S1", "GET\napi/v1/users/42\n\n1700000000\n");
/// assert_eq!(sig, "djrRsWeUdyikGY868Je6qDK8Z0pzdOJMbRp0aHmC8Ng=");
/// ```
#[must_use]
pub fn compute_signature(secret: &str, string_to_sign: &str) -> String {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(secret.as_bytes())
        .expect("HMAC can accept keys of any length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Sign a request with the current time, attaching the transport headers.
///
/// `body` must be the exact bytes that will be sent.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeader`] if the credential id cannot be
/// carried in an HTTP header.
pub fn sign_request<B>(
    req: &mut http::Request<B>,
    credential_id: &str,
    secret: &str,
    body: &[u8],
) -> Result<(), AuthError> {
    let timestamp = Utc::now().timestamp().to_string();
    sign_request_at(req, credential_id, secret, body, &timestamp)
}

/// Sign a request with an explicit timestamp string.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeader`] if the credential id or timestamp
/// cannot be carried in an HTTP header.
pub fn sign_request_at<B>(
    req: &mut http::Request<B>,
    credential_id: &str,
    secret: &str,
    body: &[u8],
    timestamp: &str,
) -> Result<(), AuthError> {
    let id_value = HeaderValue::from_str(credential_id)
        .map_err(|_| AuthError::InvalidHeader(HEADER_ACCESS_KEY_ID))?;
    let timestamp_value =
        HeaderValue::from_str(timestamp).map_err(|_| AuthError::InvalidHeader(HEADER_TIMESTAMP))?;

    let signature = {
        let params = SignatureParams {
            method: req.method().as_str(),
            path: req.uri().path(),
            query_params: parse_query_params(req.uri().query().unwrap_or("")),
            timestamp,
            content: body,
            ..Default::default()
        };
        compute_signature(secret, &build_string_to_sign(&params))
    };
    let signature_value = HeaderValue::from_str(&signature)
        .map_err(|_| AuthError::InvalidHeader(HEADER_SIGNATURE))?;

    let headers = req.headers_mut();
    headers.insert(HEADER_ACCESS_KEY_ID, id_value);
    headers.insert(HEADER_TIMESTAMP, timestamp_value);
    headers.insert(HEADER_SIGNATURE, signature_value);

    debug!(credential_id, timestamp, "signed request");
    Ok(())
}

/// Verify a signed request.
///
/// Returns `Ok(false)` when the credential is unknown or inactive, or when
/// the signature does not match.
///
/// # Errors
///
/// Returns an [`AuthError`] if:
/// - A transport header is missing or malformed
/// - The timestamp violates the freshness policy
/// - The credential provider fails
pub fn verify_request(
    parts: &http::request::Parts,
    body: &[u8],
    credential_provider: &dyn CredentialProvider,
    policy: &TimestampPolicy,
) -> Result<bool, AuthError> {
    let fields = SignedFields::from_parts(parts)?;
    verify_fields(&fields, parts, body, credential_provider, policy)
}

/// Verify already-extracted transport fields against the request they came with.
///
/// # Errors
///
/// See [`verify_request`].
pub fn verify_fields(
    fields: &SignedFields,
    parts: &http::request::Parts,
    body: &[u8],
    credential_provider: &dyn CredentialProvider,
    policy: &TimestampPolicy,
) -> Result<bool, AuthError> {
    policy.check(&fields.timestamp, Utc::now())?;

    let secret = match credential_provider.get_secret_key(&fields.credential_id) {
        Ok(secret) => secret,
        Err(AuthError::CredentialNotFound(_) | AuthError::CredentialInactive(_)) => {
            debug!(credential_id = %fields.credential_id, "credential unknown or inactive");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let params = SignatureParams::from_parts(parts, &fields.timestamp, body);
    let string_to_sign = build_string_to_sign(&params);

    debug!(string_to_sign, "Built string to sign");

    let expected_signature = compute_signature(&secret, &string_to_sign);

    // Constant-time comparison to prevent timing attacks.
    let matches: bool = fields
        .signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into();

    if matches {
        debug!(credential_id = %fields.credential_id, "Signature verification succeeded");
    } else {
        debug!(credential_id = %fields.credential_id, "Signature mismatch");
    }

    Ok(matches)
}

/// Extract a non-empty header value as a string.
fn required_header(
    parts: &http::request::Parts,
    name: &'static str,
) -> Result<String, AuthError> {
    let value = parts
        .headers
        .get(name)
        .ok_or(AuthError::MissingHeader(name))?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader(name))?;

    if value.is_empty() {
        return Err(AuthError::MissingHeader(name));
    }

    Ok(value.to_owned())
}
