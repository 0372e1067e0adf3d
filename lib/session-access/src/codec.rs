//! Compact encrypted session tokens.
//!
//! Tokens are JWE compact serializations using direct encryption with
//! AES-256-GCM (`alg: dir`, `enc: A256GCM`): five base64url segments,
//! `header..iv.ciphertext.tag`, with an empty encrypted-key segment. The
//! encoded protected header doubles as the additional authenticated data,
//! so tampering with any byte of the token fails the tag check or the
//! structural checks in front of it.
//!
//! Ciphertexts are semantic, not deterministic: every seal draws a fresh
//! 96-bit nonce, so encrypting the same payload twice yields different
//! tokens.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, OsRng, Payload},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::claims::SessionClaims;
use crate::error::TokenError;
use crate::keys::SessionKeyring;

/// Clock skew tolerated on both temporal bounds, in seconds.
const CLOCK_SKEW_SECS: i64 = 5;

/// Fixed protected header for direct AES-256-GCM encryption.
const PROTECTED_HEADER: &str = r#"{"alg":"dir","enc":"A256GCM"}"#;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Seals and opens compact encrypted session tokens.
///
/// All codec instances sharing a keyring produce mutually decryptable
/// tokens; the cipher is derived once and cached inside the keyring.
#[derive(Clone)]
pub struct SessionCodec {
    keyring: Arc<SessionKeyring>,
}

impl SessionCodec {
    /// Creates a codec over the given keyring.
    #[must_use]
    pub fn new(keyring: Arc<SessionKeyring>) -> Self {
        Self { keyring }
    }

    /// Seals a custom-claim payload into a compact encrypted token.
    ///
    /// Issued-at and not-before are set to the current time, expiration to
    /// the current time plus `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims payload cannot be serialized or the
    /// cipher fails to seal it.
    pub fn encrypt(
        &self,
        custom: BTreeMap<String, Value>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.encrypt_at(Utc::now(), custom, ttl)
    }

    /// Opens a compact encrypted token and validates its temporal claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, fails the authentication
    /// tag, is expired, or is not yet valid. Both temporal bounds tolerate
    /// five seconds of clock skew.
    pub fn decrypt(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.decrypt_at(Utc::now(), token)
    }

    fn encrypt_at(
        &self,
        now: DateTime<Utc>,
        custom: BTreeMap<String, Value>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims::issue(custom, now, ttl);
        let plaintext = serde_json::to_vec(&claims).map_err(|e| TokenError::Serialization {
            reason: e.to_string(),
        })?;

        let header = URL_SAFE_NO_PAD.encode(PROTECTED_HEADER);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .keyring
            .cipher()
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: header.as_bytes(),
                },
            )
            .map_err(|_| TokenError::Encryption)?;

        // The cipher appends the 16-byte tag to the ciphertext.
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}..{}.{}.{}",
            header,
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(ciphertext),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    fn decrypt_at(&self, now: DateTime<Utc>, token: &str) -> Result<SessionClaims, TokenError> {
        let mut segments = token.split('.');
        let (header, encrypted_key, iv, ciphertext, tag) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(header), Some(key), Some(iv), Some(ct), Some(tag), None) => {
                (header, key, iv, ct, tag)
            }
            _ => return Err(TokenError::Malformed),
        };

        // Direct encryption carries no encrypted key.
        if !encrypted_key.is_empty() {
            return Err(TokenError::Malformed);
        }
        validate_header(header)?;

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(iv)
            .map_err(|_| TokenError::Malformed)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(TokenError::Malformed);
        }

        let mut sealed = URL_SAFE_NO_PAD
            .decode(ciphertext)
            .map_err(|_| TokenError::Malformed)?;
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| TokenError::Malformed)?;
        if tag_bytes.len() != TAG_LEN {
            return Err(TokenError::Malformed);
        }
        sealed.extend_from_slice(&tag_bytes);

        let nonce = Nonce::clone_from_slice(&nonce_bytes);
        let plaintext = self
            .keyring
            .cipher()
            .decrypt(
                &nonce,
                Payload {
                    msg: &sealed,
                    aad: header.as_bytes(),
                },
            )
            .map_err(|_| TokenError::Authentication)?;

        let claims: SessionClaims =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::Authentication)?;

        let now = now.timestamp();
        if now > claims.expires_at() + CLOCK_SKEW_SECS {
            return Err(TokenError::Expired);
        }
        if now < claims.not_before() - CLOCK_SKEW_SECS {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }
}

fn validate_header(header: &str) -> Result<(), TokenError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let parsed: Value = serde_json::from_slice(&decoded).map_err(|_| TokenError::Malformed)?;

    let alg = parsed.get("alg").and_then(Value::as_str);
    let enc = parsed.get("enc").and_then(Value::as_str);
    if alg != Some("dir") || enc != Some("A256GCM") {
        return Err(TokenError::Malformed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{ADMIN_CLAIM, ARTIFACT_CLAIM};
    use base64::engine::general_purpose::STANDARD;

    fn test_codec() -> SessionCodec {
        let secret = STANDARD.encode([0x42; 32]);
        SessionCodec::new(Arc::new(
            SessionKeyring::from_secret(&secret).expect("keyring"),
        ))
    }

    fn test_claims() -> BTreeMap<String, Value> {
        let mut custom = BTreeMap::new();
        custom.insert(ARTIFACT_CLAIM.to_string(), Value::from("artifact-abc"));
        custom.insert(ADMIN_CLAIM.to_string(), Value::Bool(true));
        custom
    }

    #[test]
    fn round_trip_returns_payload_with_temporal_claims() {
        let codec = test_codec();
        let before = Utc::now().timestamp();

        let token = codec
            .encrypt(test_claims(), Duration::days(14))
            .expect("encrypt");
        let claims = codec.decrypt(&token).expect("decrypt");

        assert_eq!(claims.session_artifact(), Some("artifact-abc"));
        assert!(claims.is_admin());
        assert!(claims.issued_at() >= before);
        assert_eq!(claims.not_before(), claims.issued_at());
        assert_eq!(claims.expires_at(), claims.issued_at() + 14 * 24 * 60 * 60);
    }

    #[test]
    fn token_has_compact_jwe_shape() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 5);
        assert!(segments[1].is_empty());

        let header = URL_SAFE_NO_PAD.decode(segments[0]).expect("header");
        assert_eq!(header, PROTECTED_HEADER.as_bytes());
    }

    #[test]
    fn encrypting_twice_yields_different_tokens() {
        let codec = test_codec();
        let first = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");
        let second = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");
        assert_ne!(first, second);
    }

    #[test]
    fn expired_token_rejected_beyond_skew() {
        let codec = test_codec();
        let issued = Utc::now() - Duration::seconds(30);
        let token = codec
            .encrypt_at(issued, test_claims(), Duration::seconds(10))
            .expect("encrypt");

        assert_eq!(codec.decrypt(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expired_token_within_skew_accepted() {
        let codec = test_codec();
        let issued = Utc::now() - Duration::seconds(12);
        let token = codec
            .encrypt_at(issued, test_claims(), Duration::seconds(10))
            .expect("encrypt");

        assert!(codec.decrypt(&token).is_ok());
    }

    #[test]
    fn future_token_rejected_beyond_skew() {
        let codec = test_codec();
        let issued = Utc::now() + Duration::seconds(60);
        let token = codec
            .encrypt_at(issued, test_claims(), Duration::hours(1))
            .expect("encrypt");

        assert_eq!(codec.decrypt(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn future_token_within_skew_accepted() {
        let codec = test_codec();
        let issued = Utc::now() + Duration::seconds(3);
        let token = codec
            .encrypt_at(issued, test_claims(), Duration::hours(1))
            .expect("encrypt");

        assert!(codec.decrypt(&token).is_ok());
    }

    /// Flips one bit of one decoded byte in the given segment and
    /// reassembles the compact token.
    fn tamper_segment(token: &str, index: usize) -> String {
        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut bytes = URL_SAFE_NO_PAD.decode(&segments[index]).expect("segment");
        bytes[0] ^= 0x01;
        segments[index] = URL_SAFE_NO_PAD.encode(bytes);
        segments.join(".")
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        let tampered = tamper_segment(&token, 3);
        assert_eq!(codec.decrypt(&tampered), Err(TokenError::Authentication));
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        let tampered = tamper_segment(&token, 4);
        assert_eq!(codec.decrypt(&tampered), Err(TokenError::Authentication));
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        let tampered = tamper_segment(&token, 2);
        assert_eq!(codec.decrypt(&tampered), Err(TokenError::Authentication));
    }

    #[test]
    fn tampered_header_rejected() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        // Flipping a header byte breaks either the JSON structure or the
        // additional authenticated data; both must reject the token.
        let tampered = tamper_segment(&token, 0);
        assert!(codec.decrypt(&tampered).is_err());
    }

    #[test]
    fn malformed_tokens_rejected() {
        let codec = test_codec();

        assert_eq!(codec.decrypt(""), Err(TokenError::Malformed));
        assert_eq!(codec.decrypt("a.b.c"), Err(TokenError::Malformed));
        assert_eq!(
            codec.decrypt("!!!..!!!.!!!.!!!"),
            Err(TokenError::Malformed)
        );

        // A non-empty encrypted-key segment is not direct encryption.
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");
        let with_key = token.replacen("..", ".AAAA.", 1);
        assert_eq!(codec.decrypt(&with_key), Err(TokenError::Malformed));
    }

    #[test]
    fn header_declaring_other_algorithm_rejected() {
        let codec = test_codec();
        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");

        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        segments[0] = URL_SAFE_NO_PAD.encode(r#"{"alg":"RSA-OAEP","enc":"A256GCM"}"#);
        let swapped = segments.join(".");

        assert_eq!(codec.decrypt(&swapped), Err(TokenError::Malformed));
    }

    #[test]
    fn token_from_different_key_fails_authentication() {
        let codec = test_codec();
        let other_secret = STANDARD.encode([0x43; 32]);
        let other = SessionCodec::new(Arc::new(
            SessionKeyring::from_secret(&other_secret).expect("keyring"),
        ));

        let token = codec
            .encrypt(test_claims(), Duration::hours(1))
            .expect("encrypt");
        assert_eq!(other.decrypt(&token), Err(TokenError::Authentication));
    }
}
