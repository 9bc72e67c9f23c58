//! Landing page and health check.

use axum::{Json, extract::State, response::Response};
use serde_json::json;

use crate::access::Viewer;
use crate::error::WebError;
use crate::handlers::render;
use crate::pages::{self, HomeStats};
use crate::state::AppState;
use crate::visitor::Visitor;

/// Handler for the home page.
pub async fn home(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;

    let stats = if viewer.can_manage() {
        HomeStats {
            staff: state.store.list_staff().await?.len(),
            students: state.store.list_students().await?.len(),
            streams: state.store.list_streams().await?.len(),
            period: state.store.current_period().await.ok(),
        }
    } else {
        HomeStats {
            staff: 0,
            students: 0,
            streams: 0,
            period: state.store.current_period().await.ok(),
        }
    };

    let teaching = match &viewer.staff {
        Some(staff) => state.store.teaching_assignments(Some(staff.id)).await?,
        None => Vec::new(),
    };

    let content = pages::home_page(&viewer, &stats, &teaching);
    Ok(render(&state, visitor, &viewer, "Home", &content).await)
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "acu-server" }))
}
