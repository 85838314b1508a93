//! Access key generation.

use std::fmt;

use accessgate_core::CredentialId;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Prefix of every generated access key id.
const ACCESS_KEY_PREFIX: &str = "AK";

/// Random bytes behind an access key id (20 hex characters).
const ACCESS_KEY_ID_BYTES: usize = 10;

/// Random bytes behind a secret (256 bits).
const SECRET_BYTES: usize = 32;

/// A freshly issued credential id and its shared secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Public credential id, sent with every signed request.
    pub access_key_id: CredentialId,
    /// Shared HMAC secret, standard base64.
    pub secret: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret", &"***")
            .finish()
    }
}

/// Generate a new access key id and secret from the thread-local CSPRNG.
///
/// # Examples
///
/// ```
/// use accessgate_iam::generate_key_pair;
///
/// let pair = generate_key_pair();
/// assert!(pair.access_key_id.as_str().starts_with("AK"));
/// assert_eq!(pair.access_key_id.as_str().len(), 22);
/// assert_eq!(pair.secret.len(), 44);
/// ```
#[must_use]
pub fn generate_key_pair() -> KeyPair {
    let id_bytes: [u8; ACCESS_KEY_ID_BYTES] = rand::random();
    let secret_bytes: [u8; SECRET_BYTES] = rand::random();

    KeyPair {
        access_key_id: CredentialId::new(format!(
            "{ACCESS_KEY_PREFIX}{}",
            hex::encode_upper(id_bytes)
        )),
        secret: BASE64.encode(secret_bytes),
    }
}
