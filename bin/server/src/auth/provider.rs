//! Identity provider client.
//!
//! The server never verifies externally issued ID tokens itself; that is
//! delegated to the identity provider's REST API. [`IdentityVerifier`] is
//! the boundary trait, [`RestIdentityVerifier`] the production client.
//! Every provider call carries the configured timeout, so a stalled
//! provider surfaces as an ordinary provider error rather than a hung
//! login request.

use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use crate::config::ProviderConfig;

/// Identity attested by the provider for a verified ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedIdentity {
    /// Provider-assigned unique user id.
    pub uid: String,
    /// Claims bound into the verified token.
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// User record fetched from the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Provider-assigned unique user id.
    pub uid: String,
    /// Custom claims attached to the account.
    #[serde(default)]
    pub custom_claims: CustomClaims,
}

/// Custom claims attached to a provider account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomClaims {
    /// Whether the account has administrative access.
    #[serde(default)]
    pub admin: bool,
}

/// Boundary to the external identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies an externally issued ID token.
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, ProviderError>;

    /// Mints a provider session artifact valid for `ttl`.
    async fn create_session_token(
        &self,
        id_token: &str,
        ttl: Duration,
    ) -> Result<String, ProviderError>;

    /// Fetches the user record, including custom claims, for a verified uid.
    async fn fetch_user(&self, uid: &str) -> Result<UserRecord, ProviderError>;
}

/// REST client for the identity provider.
pub struct RestIdentityVerifier {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl RestIdentityVerifier {
    /// Creates a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IdentityVerifier for RestIdentityVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("v1/tokens:verify"))
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected {
                status: response.status().as_u16(),
            });
        }

        response
            .json::<VerifiedIdentity>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }

    async fn create_session_token(
        &self,
        id_token: &str,
        ttl: Duration,
    ) -> Result<String, ProviderError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SessionResponse {
            session_token: String,
        }

        let response = self
            .http
            .post(self.endpoint("v1/sessions"))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "idToken": id_token,
                "validDuration": ttl.num_seconds(),
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected {
                status: response.status().as_u16(),
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(session.session_token)
    }

    async fn fetch_user(&self, uid: &str) -> Result<UserRecord, ProviderError> {
        let response = self
            .http
            .get(self.endpoint(&format!("v1/users/{uid}")))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected {
                status: response.status().as_u16(),
            });
        }

        response
            .json::<UserRecord>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

/// Identity provider errors.
///
/// These are logged at the handler boundary and collapsed into a single
/// credential-failure response; none of the detail reaches the client.
#[derive(Debug)]
pub enum ProviderError {
    /// Client-side configuration error.
    Configuration(String),
    /// Transport failure, including timeouts.
    Transport(String),
    /// The provider rejected the request.
    Rejected { status: u16 },
    /// The provider's response could not be decoded.
    MalformedResponse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "provider configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "provider transport error: {msg}"),
            Self::Rejected { status } => {
                write!(f, "provider rejected the request with status {status}")
            }
            Self::MalformedResponse(msg) => {
                write!(f, "provider returned a malformed response: {msg}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}
