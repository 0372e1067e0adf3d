//! Session credentials for the marquee ticketing platform.
//!
//! This crate provides:
//! - Claims payloads carried inside encrypted session tokens (`SessionClaims`)
//! - Symmetric key material management (`SessionKeyring`)
//! - The compact encrypted token codec (`SessionCodec`)
//!
//! # Session Model
//!
//! Sessions are stateless: after the identity provider verifies a login,
//! the server seals the provider's session artifact and the user's
//! capabilities into a compact AES-256-GCM token and hands it to the
//! browser as a cookie. No server-side session store exists; possession of
//! a token that decrypts under the process key *is* the session.
//!
//! The admin capability is carried inside the sealed payload. The web tier
//! also sets a plaintext marker cookie for cheap route classification, but
//! that marker is a routing hint only - authorization is always re-derived
//! from the decrypted payload.
//!
//! # Example
//!
//! ```
//! use marquee_session_access::{SessionCodec, SessionKeyring};
//! use chrono::Duration;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! // 32 zero bytes, base64 encoded.
//! let secret = "A".repeat(43);
//! let keyring = Arc::new(SessionKeyring::from_secret(&secret).unwrap());
//! let codec = SessionCodec::new(keyring);
//!
//! let mut claims = BTreeMap::new();
//! claims.insert("token".to_string(), "provider-artifact".into());
//! claims.insert("admin".to_string(), true.into());
//!
//! let sealed = codec.encrypt(claims, Duration::days(14)).unwrap();
//! let opened = codec.decrypt(&sealed).unwrap();
//!
//! assert_eq!(opened.session_artifact(), Some("provider-artifact"));
//! assert!(opened.is_admin());
//! ```

pub mod claims;
pub mod codec;
pub mod error;
pub mod keys;

// Re-export main types at crate root
pub use claims::{ADMIN_CLAIM, ARTIFACT_CLAIM, SessionClaims};
pub use codec::SessionCodec;
pub use error::{KeyError, TokenError};
pub use keys::SessionKeyring;
