//! Request handlers, grouped by area.

pub mod academics;
pub mod directory;
pub mod home;
pub mod homework;
pub mod login;
pub mod teaching;

use acu_auth::FlashLevel;
use acu_core::SchoolError;
use axum::response::{Html, Redirect, Response};

use crate::access::Viewer;
use crate::error::WebError;
use crate::state::AppState;
use crate::templates;
use crate::visitor::Visitor;

/// Render `content` inside the layout, consuming pending flashes.
pub(crate) async fn render(
    state: &AppState,
    mut visitor: Visitor,
    viewer: &Viewer,
    title: &str,
    content: &str,
) -> Response {
    let flashes = visitor.session.take_flashes();
    let html = templates::layout(title, Some(viewer), &flashes, content);
    visitor.respond(state, Html(html)).await
}

/// Queue a message and redirect (post/redirect/get).
pub(crate) async fn flash_redirect(
    state: &AppState,
    mut visitor: Visitor,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    visitor.session.flash(level, message);
    visitor.respond(state, Redirect::to(to)).await
}

/// Send a rejected form back to where it came from with the reason as a
/// flash message. Errors that are not about the submitted input propagate.
pub(crate) async fn bounce(
    state: &AppState,
    visitor: Visitor,
    err: WebError,
    back: &str,
) -> Result<Response, WebError> {
    match err {
        WebError::School(
            e @ (SchoolError::Invalid(_)
            | SchoolError::NoAcademicPeriod
            | SchoolError::PasswordMismatch
            | SchoolError::PasswordTooShort { .. }),
        ) => Ok(flash_redirect(state, visitor, FlashLevel::Error, e.to_string(), back).await),
        other => Err(other),
    }
}

/// Load an entity or fail with 404.
pub(crate) fn found<T>(value: Option<T>, what: impl FnOnce() -> String) -> Result<T, WebError> {
    value.ok_or_else(|| SchoolError::NotFound(what()).into())
}
