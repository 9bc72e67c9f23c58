//! Login, logout.

use acu_auth::{FlashLevel, LoginFlow, LoginSubmission, Step};
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, Redirect, Response},
};
use serde::Deserialize;

use crate::error::WebError;
use crate::pages;
use crate::state::AppState;
use crate::visitor::Visitor;

/// Login page query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub reset: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Login form data. Which fields matter depends on the current step.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if is_local_path(n) => n,
        _ => "/",
    }
}

/// A path with one leading `/`. Browsers read `\` as `/` and drop tabs and
/// newlines, so neither may appear anywhere in it.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.contains("://")
        && !path.chars().any(char::is_control)
}

fn login_url(next: &str) -> String {
    if next == "/" {
        "/login/".to_string()
    } else {
        format!("/login/?next={}", urlencoding::encode(next))
    }
}

/// Handler for the login page (GET)
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    mut visitor: Visitor,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();

    if query.reset.as_deref() == Some("true") {
        LoginFlow::<acu_store::Store>::reset(&mut visitor.session.login);
        tracing::debug!("login flow reset by visitor");
        return visitor.respond(&state, Redirect::to(&login_url(&next))).await;
    }

    if visitor.session.is_authenticated() {
        return visitor.respond(&state, Redirect::to(&next)).await;
    }

    let flashes = visitor.session.take_flashes();
    let html = pages::login_document(&visitor.session.login, &next, &flashes);
    visitor.respond(&state, Html(html)).await
}

/// Handler for login form submission (POST)
pub async fn login_submit(
    State(state): State<AppState>,
    mut visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let flow = LoginFlow::new(&state.store);
    let submission = LoginSubmission {
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
    };

    let result = flow.submit(&mut visitor.session.login, &submission).await;

    match result {
        Ok(Step::Continue) => Ok(visitor.respond(&state, Redirect::to(&login_url(&next))).await),
        Ok(step @ (Step::Authenticated(_) | Step::Registered { .. })) => {
            let welcome = match &step {
                Step::Registered { role, .. } => {
                    format!("Password created successfully! Welcome, {}!", role.title())
                }
                _ => "Login successful!".to_string(),
            };
            if let Some(who) = step.identity() {
                visitor.session.establish(who.clone());
            }
            visitor.rotate();
            visitor.session.flash(FlashLevel::Success, welcome);
            Ok(visitor.respond(&state, Redirect::to(&next)).await)
        }
        Err(e) => match e.as_school() {
            Some(reason) => {
                let message = reason.to_string();
                visitor.session.flash(FlashLevel::Error, message);
                Ok(visitor.respond(&state, Redirect::to(&login_url(&next))).await)
            }
            None => Err(e.into()),
        },
    }
}

/// Handler for logout
pub async fn logout(State(state): State<AppState>, mut visitor: Visitor) -> Response {
    if let Some(who) = visitor.identity() {
        tracing::info!(identity_id = who.identity_id, "logged out");
    }
    visitor.session.logout();
    visitor.rotate();
    visitor
        .session
        .flash(FlashLevel::Success, "You have been logged out successfully.");
    visitor.respond(&state, Redirect::to("/login/")).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/staff/")), "/staff/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\\/evil.example")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/staff/\r\nSet-Cookie: x=1")), "/");
        assert_eq!(safe_next(Some("/go?to=https://evil.example")), "/");
        assert_eq!(safe_next(Some("/homework/3/?tab=submissions")), "/homework/3/?tab=submissions");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
