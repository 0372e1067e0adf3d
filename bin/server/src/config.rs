//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! The session secret has no default: a process started without
//! `SESSION__SECRET` fails inside [`ServerConfig::from_env`] rather than
//! on the first login.

use serde::Deserialize;

/// Server configuration composed from section configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session cookie and token configuration.
    pub session: SessionConfig,

    /// Identity provider configuration.
    pub provider: ProviderConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Symmetric secret for session token encryption, base64 or base64url
    /// encoded, decoding to 32 bytes. Required.
    pub secret: String,

    /// Session lifetime in days. Applies to the encrypted token and both
    /// cookies.
    #[serde(default = "default_session_duration_days")]
    pub duration_days: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the identity provider's REST API.
    pub base_url: String,

    /// API key sent with provider requests.
    pub api_key: String,

    /// Timeout for provider calls, in seconds. A timed-out verification is
    /// reported to the client as a credential failure.
    #[serde(default = "default_provider_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_duration_days() -> i64 {
    14
}

fn default_secure_cookies() -> bool {
    true
}

fn default_provider_timeout_seconds() -> u64 {
    10
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
