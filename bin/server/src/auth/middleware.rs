//! Authorization extractors for Axum.
//!
//! Extractors authenticate by decrypting the session cookie through the
//! codec. The plaintext marker cookie is never consulted here: it belongs
//! to the route guard's coarse classification, not to authorization.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use marquee_session_access::SessionClaims;
use serde_json::json;
use std::sync::Arc;

use super::{AppState, SESSION_COOKIE};

/// Extractor requiring a valid decrypted session.
///
/// An absent, malformed, tampered, or expired session cookie rejects the
/// request; all four cases are indistinguishable to the caller.
pub struct CurrentSession(pub SessionClaims);

impl<S> FromRequestParts<S> for CurrentSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| SessionRejection::InternalError)?;

        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or(SessionRejection::NotAuthenticated)?;

        // An undecryptable or expired token is treated exactly like a
        // missing cookie.
        let claims = app_state
            .codec
            .decrypt(cookie.value())
            .map_err(|_| SessionRejection::NotAuthenticated)?;

        Ok(CurrentSession(claims))
    }
}

/// Extractor requiring the admin capability inside the decrypted session.
///
/// Authorization comes from the authenticated payload, never from the
/// plaintext marker cookie.
pub struct RequireAdmin(pub SessionClaims);

impl<S> FromRequestParts<S> for RequireAdmin
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(claims) = CurrentSession::from_request_parts(parts, state).await?;

        if !claims.is_admin() {
            return Err(SessionRejection::AdminRequired);
        }

        Ok(RequireAdmin(claims))
    }
}

/// Rejection type for session extractors.
#[derive(Debug)]
pub enum SessionRejection {
    NotAuthenticated,
    AdminRequired,
    InternalError,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::AdminRequired => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "data": "Error" }))).into_response()
    }
}
