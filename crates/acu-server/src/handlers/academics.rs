//! Academic setup: classes, streams, subjects, years and terms.
//!
//! Every create is idempotent on the natural key, so resubmitting a form
//! only reports success again.

use acu_auth::FlashLevel;
use axum::{extract::State, response::Response};

use crate::access::Viewer;
use crate::error::WebError;
use crate::forms::{self, FormFields};
use crate::handlers::{bounce, flash_redirect, render};
use crate::pages::{self, AcademicsView};
use crate::state::AppState;
use crate::visitor::Visitor;

const BACK: &str = "/academics/";

pub async fn academics_page(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let classes = state.store.list_classes().await?;
    let streams = state.store.list_streams().await?;
    let subjects = state.store.list_subjects().await?;
    let periods = state.store.list_periods().await?;
    let terms = state.store.list_terms().await?;

    let content = pages::academics_page(&AcademicsView {
        classes: &classes,
        streams: &streams,
        subjects: &subjects,
        periods: &periods,
        terms: &terms,
    });
    Ok(render(&state, visitor, &viewer, "Academics", &content).await)
}

/// Report the outcome of a create form back on the academics page.
async fn finish(
    state: &AppState,
    visitor: Visitor,
    outcome: Result<String, WebError>,
) -> Result<Response, WebError> {
    match outcome {
        Ok(message) => Ok(flash_redirect(state, visitor, FlashLevel::Success, message, BACK).await),
        Err(e) => bounce(state, visitor, e, BACK).await,
    }
}

pub async fn create_class(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?.require_manager()?;

    let outcome = async {
        let class = state.store.ensure_class(fields.get("name")).await?;
        Ok::<_, WebError>(format!("Class {} saved.", class.name))
    }
    .await;
    finish(&state, visitor, outcome).await
}

pub async fn create_stream(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?.require_manager()?;

    let outcome = async {
        let class_id = fields.id("class", "Class")?;
        let stream = state.store.ensure_stream(class_id, fields.get("name")).await?;
        Ok::<_, WebError>(format!("Stream {} saved.", stream.label()))
    }
    .await;
    finish(&state, visitor, outcome).await
}

pub async fn create_subject(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?.require_manager()?;

    let outcome = async {
        let class_id = fields.id("class", "Class")?;
        let subject = state.store.ensure_subject(class_id, fields.get("name")).await?;
        Ok::<_, WebError>(format!("Subject {} saved.", subject.name))
    }
    .await;
    finish(&state, visitor, outcome).await
}

pub async fn create_period(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?.require_manager()?;

    let outcome = async {
        let input = forms::period_input(&fields)?;
        let period = state
            .store
            .create_period(&input.name, input.start_date, input.end_date, input.is_current)
            .await?;
        Ok::<_, WebError>(format!("Academic year {} saved.", period.name))
    }
    .await;
    finish(&state, visitor, outcome).await
}

pub async fn create_term(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?.require_manager()?;

    let outcome = async {
        let period_id = fields.id("period", "Academic year")?;
        let input = forms::period_input(&fields)?;
        let term = state
            .store
            .create_term(period_id, &input.name, input.start_date, input.end_date, input.is_current)
            .await?;
        Ok::<_, WebError>(format!("Term {} saved.", term.name))
    }
    .await;
    finish(&state, visitor, outcome).await
}
