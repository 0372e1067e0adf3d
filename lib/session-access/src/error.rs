//! Error types for the session-access crate.
//!
//! - `KeyError`: secret decoding/validation failures, surfaced at startup
//! - `TokenError`: sealed-token failures, treated as "not authenticated"

use std::fmt;

/// Errors from decoding and validating the configured session secret.
///
/// These are construction-time errors: a bad secret fails process startup
/// rather than the first request that needs the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The configured secret is empty.
    EmptySecret,
    /// The secret is not valid base64 or base64url.
    InvalidEncoding { reason: String },
    /// The decoded secret is not the required key length.
    InvalidLength { expected: usize, actual: usize },
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "session secret is empty"),
            Self::InvalidEncoding { reason } => {
                write!(f, "session secret is not valid base64: {reason}")
            }
            Self::InvalidLength { expected, actual } => {
                write!(
                    f,
                    "session secret decodes to {actual} bytes, expected {expected}"
                )
            }
        }
    }
}

impl std::error::Error for KeyError {}

/// Errors from sealing or opening encrypted session tokens.
///
/// Decrypt-time failures deliberately collapse into a small taxonomy so a
/// caller can treat any of them as "not authenticated" without learning
/// which stage rejected the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The compact token does not have the expected structure.
    Malformed,
    /// The authentication tag did not verify, or the decrypted payload is
    /// not a valid claims document.
    Authentication,
    /// The token is expired beyond the allowed clock skew.
    Expired,
    /// The token's not-before bound is in the future beyond the allowed
    /// clock skew.
    NotYetValid,
    /// The claims payload could not be serialized for encryption.
    Serialization { reason: String },
    /// The cipher failed to seal the payload.
    Encryption,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed session token"),
            Self::Authentication => write!(f, "session token failed authentication"),
            Self::Expired => write!(f, "session token has expired"),
            Self::NotYetValid => write!(f, "session token is not yet valid"),
            Self::Serialization { reason } => {
                write!(f, "failed to serialize session claims: {reason}")
            }
            Self::Encryption => write!(f, "failed to encrypt session claims"),
        }
    }
}

impl std::error::Error for TokenError {}
