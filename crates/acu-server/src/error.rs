//! Error types for the HTTP layer.

use acu_auth::AuthError;
use acu_core::SchoolError;
use acu_store::StoreError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::templates;

/// Errors a handler can end with.
#[derive(Debug, Error)]
pub enum WebError {
    /// No authenticated identity; send the visitor to the login page.
    #[error("login required")]
    LoginRequired { next: String },

    /// A domain rule rejected the request.
    #[error(transparent)]
    School(SchoolError),

    /// Malformed request body or query.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    pub fn login_required(next: impl Into<String>) -> Self {
        Self::LoginRequired { next: next.into() }
    }

    fn status(&self) -> StatusCode {
        match self {
            WebError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            WebError::School(SchoolError::NotFound(_)) => StatusCode::NOT_FOUND,
            WebError::School(SchoolError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            WebError::School(_) | WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SchoolError> for WebError {
    fn from(e: SchoolError) -> Self {
        WebError::School(e)
    }
}

impl From<StoreError> for WebError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::School(s) => WebError::School(s),
            other => WebError::Internal(other.into()),
        }
    }
}

impl From<AuthError> for WebError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::School(s) => WebError::School(s),
            AuthError::Store(s) => s.into(),
            other => WebError::Internal(other.into()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            WebError::LoginRequired { next } => {
                Redirect::to(&format!("/login/?next={}", urlencoding::encode(&next))).into_response()
            }
            WebError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (
                    status,
                    Html(templates::error_page(status, "Something went wrong on our side.")),
                )
                    .into_response()
            }
            other => {
                tracing::debug!(error = %other, status = status.as_u16(), "request rejected");
                (status, Html(templates::error_page(status, &other.to_string()))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            WebError::from(SchoolError::not_found("stream 9")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(SchoolError::denied("staff only")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebError::from(StoreError::School(SchoolError::NoAcademicPeriod)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::from(StoreError::Conflict("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_login_redirect_keeps_target() {
        let resp = WebError::login_required("/staff/?page=2").into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers()["location"],
            "/login/?next=%2Fstaff%2F%3Fpage%3D2"
        );
    }
}
