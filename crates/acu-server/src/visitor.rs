//! Session cookie handling.
//!
//! Every request gets a [`Visitor`]: the session named by the `acu_session`
//! cookie, or a fresh one. Handlers mutate `visitor.session` and hand their
//! response to [`Visitor::respond`], which saves the session and sets the
//! cookie when the id changed. Cookies and stored sessions share one
//! lifetime, [`SESSION_TTL`].

use acu_auth::{AuthenticatedIdentity, SESSION_TTL, Session, SessionId};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;

use crate::state::AppState;

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "acu_session";

pub struct Visitor {
    pub id: SessionId,
    pub session: Session,
    /// Path and query of the request, for post-login redirects.
    pub path: String,
    issue_cookie: bool,
    retired: Option<SessionId>,
}

impl Visitor {
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.session.identity.as_ref()
    }

    /// Issue a new session id, discarding the old one on save.
    ///
    /// Called whenever the authentication state changes so a session id
    /// seen before login is never valid after it.
    pub fn rotate(&mut self) {
        let old = std::mem::replace(&mut self.id, SessionId::generate());
        self.retired.get_or_insert(old);
        self.issue_cookie = true;
    }

    /// Persist the session and attach the cookie if needed.
    ///
    /// A blank session is dropped instead of stored, so anonymous page
    /// views leave nothing behind.
    pub async fn respond(self, state: &AppState, response: impl IntoResponse) -> Response {
        if let Some(old) = &self.retired {
            state.sessions.remove(old).await;
        }
        let mut response = response.into_response();
        if self.session.is_blank() {
            state.sessions.remove(&self.id).await;
            return response;
        }
        state.sessions.save(&self.id, &self.session).await;

        if self.issue_cookie {
            let cookie = format!(
                "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                SESSION_COOKIE_NAME,
                self.id,
                SESSION_TTL.as_secs()
            );
            match cookie.parse() {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "session cookie is not a valid header"),
            }
        }
        response
    }
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let existing = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(extract_session_cookie)
            .and_then(|raw| SessionId::parse(&raw));

        if let Some(id) = existing {
            if let Some(session) = state.sessions.load(&id).await {
                return Ok(Self {
                    id,
                    session,
                    path,
                    issue_cookie: false,
                    retired: None,
                });
            }
        }

        Ok(Self {
            id: SessionId::generate(),
            session: Session::default(),
            path,
            issue_cookie: true,
            retired: None,
        })
    }
}

/// Extract session cookie value from cookie header
fn extract_session_cookie(cookies: &str) -> Option<String> {
    for cookie in cookies.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(&format!("{}=", SESSION_COOKIE_NAME)) {
            return Some(value.to_string());
        }
    }
    None
}
