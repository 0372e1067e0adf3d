//! Session issuance, revocation, and introspection routes.

use axum::{
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration as ChronoDuration;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::Duration as TimeDuration;

use marquee_session_access::{ADMIN_CLAIM, ARTIFACT_CLAIM};

use super::{AppState, MEMBER_COOKIE, SESSION_COOKIE, middleware::CurrentSession};

/// Request body for the login endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// ID token obtained from the identity provider by the client.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Outcome of a successful session issuance.
struct IssuedSession {
    /// Encrypted session token for the session cookie.
    token: String,
    /// Whether the identity carries the admin capability.
    admin: bool,
}

/// Exchanges a client-supplied ID token for an encrypted session cookie.
///
/// Admin identities additionally receive the plaintext marker cookie used
/// by the route guard. Both cookies share the configured session lifetime.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let id_token = body
        .ok()
        .and_then(|Json(request)| request.id_token)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let issued = issue_session(&state, &id_token).await?;

    let ttl = TimeDuration::days(state.session_config.duration_days);
    let session_cookie = Cookie::build((SESSION_COOKIE, issued.token))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(ttl);

    let mut jar = jar.add(session_cookie);

    if issued.admin {
        let member_cookie = Cookie::build((MEMBER_COOKIE, "true"))
            .path("/")
            .http_only(true)
            .secure(state.session_config.secure_cookies)
            .same_site(SameSite::Strict)
            .max_age(ttl);
        jar = jar.add(member_cookie);
    }

    Ok((jar, Json(json!({ "ok": true }))))
}

/// Verifies the ID token with the provider and mints the encrypted session.
///
/// Every failure collapses into [`AuthError::InvalidCredential`]; the
/// underlying cause is logged here and never reaches the client.
async fn issue_session(state: &AppState, id_token: &str) -> Result<IssuedSession, AuthError> {
    let identity = state
        .verifier
        .verify_id_token(id_token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "ID token verification failed");
            AuthError::InvalidCredential
        })?;

    let user = state.verifier.fetch_user(&identity.uid).await.map_err(|e| {
        tracing::warn!(error = %e, uid = %identity.uid, "user lookup failed");
        AuthError::InvalidCredential
    })?;
    let admin = user.custom_claims.admin;

    let ttl = ChronoDuration::days(state.session_config.duration_days);
    let artifact = state
        .verifier
        .create_session_token(id_token, ttl)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, uid = %identity.uid, "session artifact creation failed");
            AuthError::InvalidCredential
        })?;

    let mut claims = BTreeMap::new();
    claims.insert(ARTIFACT_CLAIM.to_string(), serde_json::Value::String(artifact));
    claims.insert(ADMIN_CLAIM.to_string(), serde_json::Value::Bool(admin));

    let token = state.codec.encrypt(claims, ttl).map_err(|e| {
        tracing::error!(error = %e, "failed to seal session token");
        AuthError::InvalidCredential
    })?;

    tracing::info!(uid = %identity.uid, admin, "session issued");

    Ok(IssuedSession { token, admin })
}

/// Revokes the browser session by clearing both cookies.
///
/// Always succeeds; removing an absent cookie is a no-op.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);
    let remove_member = Cookie::build((MEMBER_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (
        jar.add(remove_session).add(remove_member),
        Json(json!({ "ok": true })),
    )
}

/// Reports whether the caller holds a valid session and the admin
/// capability.
///
/// Authorization is re-derived from the decrypted session payload; the
/// plaintext marker cookie is never consulted here.
pub async fn me(CurrentSession(claims): CurrentSession) -> impl IntoResponse {
    Json(json!({ "ok": true, "admin": claims.is_admin() }))
}

/// Authentication errors surfaced by the session routes.
#[derive(Debug)]
pub enum AuthError {
    /// The request body is missing the ID token.
    MissingToken,
    /// Identity verification or session issuance failed.
    InvalidCredential,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::InvalidCredential => StatusCode::UNAUTHORIZED,
        };

        // Fixed body for every failure; nothing about the cause leaks out.
        (status, Json(json!({ "data": "Error" }))).into_response()
    }
}
