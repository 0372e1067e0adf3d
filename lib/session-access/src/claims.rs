//! Claims payloads carried inside encrypted session tokens.
//!
//! A claims payload is a mapping of custom string-keyed claims plus the
//! standard temporal claims (`iat`, `nbf`, `exp`), all in seconds since the
//! Unix epoch. Payloads are created per login and immutable once sealed.
//!
//! The admin capability travels inside the payload, protected by the
//! token's authentication tag. The plaintext marker cookie the web tier
//! sets alongside the session is a routing hint only and must never be the
//! basis of an authorization decision.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim key under which the provider session artifact is stored.
pub const ARTIFACT_CLAIM: &str = "token";

/// Claim key for the admin capability.
pub const ADMIN_CLAIM: &str = "admin";

/// Claims carried inside an encrypted session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Custom claims.
    #[serde(flatten)]
    custom: BTreeMap<String, Value>,
    /// Issued-at, seconds since epoch.
    iat: i64,
    /// Not-before, seconds since epoch.
    nbf: i64,
    /// Expiration, seconds since epoch.
    exp: i64,
}

impl SessionClaims {
    /// Creates a payload issued at `issued_at` and valid for `ttl`.
    ///
    /// Issued-at and not-before are both set to `issued_at`. Temporal
    /// claims are authoritative: reserved names in the custom map are
    /// discarded so they cannot serialize as duplicate keys.
    pub(crate) fn issue(
        mut custom: BTreeMap<String, Value>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        custom.remove("iat");
        custom.remove("nbf");
        custom.remove("exp");

        let iat = issued_at.timestamp();
        Self {
            custom,
            iat,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Returns a custom claim by name.
    #[must_use]
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.custom.get(claim)
    }

    /// Returns the custom-claim mapping.
    #[must_use]
    pub fn custom(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }

    /// Issued-at, seconds since epoch.
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    /// Not-before, seconds since epoch.
    #[must_use]
    pub fn not_before(&self) -> i64 {
        self.nbf
    }

    /// Expiration, seconds since epoch.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Returns the provider session artifact, if present.
    #[must_use]
    pub fn session_artifact(&self) -> Option<&str> {
        self.custom.get(ARTIFACT_CLAIM).and_then(Value::as_str)
    }

    /// Returns true if the payload carries the admin capability.
    ///
    /// This is the authoritative admin check; the claim is covered by the
    /// token's authentication tag, unlike the plaintext marker cookie.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.custom
            .get(ADMIN_CLAIM)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
