//! Route-guard middleware.
//!
//! Every request is classified against a static prefix table before any
//! handler runs. The guard reads only cookie presence and the plaintext
//! marker cookie, so it is a coarse routing layer, not an authorization
//! boundary: a present-but-invalid session cookie passes the guard and is
//! rejected by the handler-side extractors, and the marker only picks
//! which view a request lands on. The classification itself is a pure
//! function so every branch is testable without a network stack.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::{AppState, MEMBER_COOKIE, SESSION_COOKIE};

/// Path the admin scan view lives at; ticket links are rewritten here for
/// admins.
const TICKET_DESK_PATH: &str = "/admin/ticket";

/// Decision produced by the route classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Pass the request through unchanged.
    Allow,
    /// Redirect to the login page.
    RedirectToLogin,
    /// Redirect to the storefront home page.
    RedirectToHome,
    /// Redirect to the admin scan view, forwarding the original query.
    RedirectToTicketDesk { query: Option<String> },
}

/// Static route classification table.
///
/// Defined once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RouteRules {
    /// Prefixes that require a session cookie to be present.
    protected: Vec<String>,
    /// Prefix of the public ticket page.
    ticket_prefix: String,
    /// Prefix of the admin dashboard.
    admin_prefix: String,
}

impl RouteRules {
    /// Creates a custom classification table.
    #[must_use]
    pub fn new(protected: Vec<String>, ticket_prefix: String, admin_prefix: String) -> Self {
        Self {
            protected,
            ticket_prefix,
            admin_prefix,
        }
    }

    /// Classifies a request.
    ///
    /// Rules are evaluated in a fixed order; the first match wins.
    #[must_use]
    pub fn evaluate(
        &self,
        path: &str,
        query: Option<&str>,
        has_session: bool,
        member: bool,
    ) -> RouteDecision {
        // 1. Protected prefixes require a session cookie. Its validity is
        //    not checked here; handlers verify the decrypted payload.
        if !has_session
            && self
                .protected
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return RouteDecision::RedirectToLogin;
        }

        // 2. Ticket links: admins land on the scan view, everyone else
        //    sees the public page.
        if path.starts_with(self.ticket_prefix.as_str()) {
            if member {
                return RouteDecision::RedirectToTicketDesk {
                    query: query.map(str::to_string),
                };
            }
            return RouteDecision::Allow;
        }

        // 3. The admin dashboard is hidden from non-members.
        if path.starts_with(self.admin_prefix.as_str()) {
            if member {
                return RouteDecision::Allow;
            }
            return RouteDecision::RedirectToHome;
        }

        RouteDecision::Allow
    }
}

impl Default for RouteRules {
    /// The storefront route table.
    fn default() -> Self {
        Self {
            protected: vec![
                "/account".to_string(),
                "/checkout".to_string(),
                "/orders".to_string(),
                "/admin".to_string(),
            ],
            ticket_prefix: "/ticket".to_string(),
            admin_prefix: "/admin".to_string(),
        }
    }
}

/// Axum middleware applying the route classifier before handlers run.
///
/// The guard never fails a request: unclassified paths pass through, and
/// cookie values it cannot interpret count as absent.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let query = request.uri().query();
    let has_session = jar.get(SESSION_COOKIE).is_some();
    let member = jar
        .get(MEMBER_COOKIE)
        .is_some_and(|cookie| cookie.value() == "true");

    match state.route_rules.evaluate(path, query, has_session, member) {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::RedirectToLogin => Redirect::to("/login").into_response(),
        RouteDecision::RedirectToHome => Redirect::to("/").into_response(),
        RouteDecision::RedirectToTicketDesk { query } => {
            let target = match query {
                Some(query) => format!("{TICKET_DESK_PATH}?{query}"),
                None => TICKET_DESK_PATH.to_string(),
            };
            Redirect::to(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RouteRules {
        RouteRules::default()
    }

    #[test]
    fn protected_path_without_session_redirects_to_login() {
        let decision = rules().evaluate("/checkout", None, false, false);
        assert_eq!(decision, RouteDecision::RedirectToLogin);
    }

    #[test]
    fn protected_path_with_session_is_allowed() {
        // The guard does not judge token validity; handlers do.
        let decision = rules().evaluate("/account/profile", None, true, false);
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn admin_path_without_any_cookies_redirects_to_login() {
        // The session check outranks the member check.
        let decision = rules().evaluate("/admin", None, false, false);
        assert_eq!(decision, RouteDecision::RedirectToLogin);
    }

    #[test]
    fn admin_path_without_marker_redirects_home() {
        let decision = rules().evaluate("/admin/dashboard", None, true, false);
        assert_eq!(decision, RouteDecision::RedirectToHome);
    }

    #[test]
    fn admin_path_with_marker_is_allowed() {
        let decision = rules().evaluate("/admin/dashboard", None, true, true);
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn ticket_path_without_marker_is_allowed() {
        let decision = rules().evaluate("/ticket", Some("token=abc123"), true, false);
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn ticket_path_with_marker_rewrites_to_scan_view_with_query() {
        let decision = rules().evaluate("/ticket", Some("token=abc123"), true, true);
        assert_eq!(
            decision,
            RouteDecision::RedirectToTicketDesk {
                query: Some("token=abc123".to_string()),
            }
        );
    }

    #[test]
    fn ticket_path_with_marker_but_no_query_still_rewrites() {
        let decision = rules().evaluate("/ticket", None, true, true);
        assert_eq!(
            decision,
            RouteDecision::RedirectToTicketDesk { query: None }
        );
    }

    #[test]
    fn ticket_path_is_public_for_anonymous_visitors() {
        let decision = rules().evaluate("/ticket", Some("token=abc123"), false, false);
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn unclassified_path_is_allowed() {
        let decision = rules().evaluate("/", None, false, false);
        assert_eq!(decision, RouteDecision::Allow);

        let decision = rules().evaluate("/events/summer-fest", None, false, false);
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn custom_table_is_honored() {
        let rules = RouteRules::new(
            vec!["/members".to_string()],
            "/pass".to_string(),
            "/staff".to_string(),
        );

        assert_eq!(
            rules.evaluate("/members", None, false, false),
            RouteDecision::RedirectToLogin
        );
        assert_eq!(
            rules.evaluate("/staff", None, true, false),
            RouteDecision::RedirectToHome
        );
        assert_eq!(rules.evaluate("/admin", None, true, false), RouteDecision::Allow);
    }
}
