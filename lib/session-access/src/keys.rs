//! Symmetric key material for session token encryption.
//!
//! A [`SessionKeyring`] is constructed once at startup from the configured
//! secret and shared behind an `Arc`. Secret decoding and length validation
//! happen at construction, so a misconfigured secret fails process startup
//! rather than the first login. The AES-256-GCM cipher itself is derived
//! lazily on first use and cached for the life of the keyring; concurrent
//! first calls may race the derivation but converge on a single cached
//! instance.

use aes_gcm::{Aes256Gcm, Key, KeyInit};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use std::sync::OnceLock;

use crate::error::KeyError;

/// AES-256 key length in bytes.
const KEY_LEN: usize = 32;

/// Holds the symmetric key used to seal and open session tokens.
pub struct SessionKeyring {
    key_bytes: [u8; KEY_LEN],
    cipher: OnceLock<Aes256Gcm>,
}

impl SessionKeyring {
    /// Decodes the configured secret and validates its length.
    ///
    /// Secrets containing `-` or `_` are decoded with the URL-safe base64
    /// alphabet; anything else is decoded as standard base64. Padded and
    /// unpadded input are both accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty, is not decodable as either
    /// encoding, or does not decode to exactly 32 bytes.
    pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::EmptySecret);
        }

        let decoded = decode_secret(secret)?;
        let key_bytes: [u8; KEY_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| KeyError::InvalidLength {
                    expected: KEY_LEN,
                    actual: decoded.len(),
                })?;

        Ok(Self {
            key_bytes,
            cipher: OnceLock::new(),
        })
    }

    /// Returns the AES-256-GCM cipher, deriving it on first use.
    ///
    /// The key length is validated at construction, so derivation itself
    /// cannot fail. All callers share the same cached cipher instance.
    pub(crate) fn cipher(&self) -> &Aes256Gcm {
        self.cipher
            .get_or_init(|| Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key_bytes)))
    }
}

impl std::fmt::Debug for SessionKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("SessionKeyring").finish_non_exhaustive()
    }
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, KeyError> {
    let attempt = if secret.contains(['-', '_']) {
        URL_SAFE
            .decode(secret)
            .or_else(|_| URL_SAFE_NO_PAD.decode(secret))
    } else {
        STANDARD
            .decode(secret)
            .or_else(|_| STANDARD_NO_PAD.decode(secret))
    };

    attempt.map_err(|e| KeyError::InvalidEncoding {
        reason: e.to_string(),
    })
}
