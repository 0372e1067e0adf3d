//! Authentication module for the marquee server.
//!
//! This module provides:
//! - Identity-provider verification of client ID tokens
//! - Stateless encrypted session cookies (no server-side session store)
//! - Route-guard middleware and authorization extractors for Axum routes
//!
//! # Authorization Model
//!
//! Two cookies are set at login:
//! - `session` holds the encrypted session token. Possession of a token
//!   that decrypts under the process key is what authenticates a request.
//! - `member` is a plaintext `"true"` flag set only for admins. It exists
//!   so the route guard can classify requests without paying for a decrypt
//!   on every page load.
//!
//! The marker is a routing hint, not a security boundary: the admin
//! capability also lives inside the encrypted payload, and privileged
//! handlers re-derive authorization from the decrypted session via the
//! extractors in [`middleware`], never from the marker.

pub mod guard;
pub mod middleware;
pub mod provider;
pub mod routes;

pub use guard::{RouteDecision, RouteRules, route_guard};
pub use middleware::{CurrentSession, RequireAdmin};
pub use provider::{IdentityVerifier, RestIdentityVerifier};
pub use routes::{login, logout, me};

use crate::config::SessionConfig;
use marquee_session_access::SessionCodec;
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Elevated-access marker cookie name.
pub const MEMBER_COOKIE: &str = "member";

/// Shared application state.
pub struct AppState {
    /// Codec for sealing and opening session tokens.
    pub codec: SessionCodec,
    /// Identity provider collaborator.
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Route classification table for the guard.
    pub route_rules: RouteRules,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        codec: SessionCodec,
        verifier: Arc<dyn IdentityVerifier>,
        session_config: SessionConfig,
        route_rules: RouteRules,
    ) -> Self {
        Self {
            codec,
            verifier,
            session_config,
            route_rules,
        }
    }
}
