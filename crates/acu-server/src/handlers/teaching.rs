//! Assigning teachers to subjects within a stream.

use acu_auth::FlashLevel;
use acu_core::SchoolError;
use acu_store::{AssignRequest, Subject};
use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::access::Viewer;
use crate::error::WebError;
use crate::forms::{self, FormFields};
use crate::handlers::{bounce, flash_redirect, render};
use crate::pages::{self, AssignStreamView};
use crate::state::AppState;
use crate::visitor::Visitor;

/// Preselection carried in the query string when a select changes.
#[derive(Debug, Default, Deserialize)]
pub struct AssignQuery {
    #[serde(default)]
    pub staff: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Handler for the assign-stream page (GET)
pub async fn assign_stream_page(
    State(state): State<AppState>,
    Query(query): Query<AssignQuery>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let staff = state.store.list_staff().await?;
    let streams = state.store.list_streams().await?;
    let selected_staff = parse_id(query.staff.as_deref());
    let selected_stream = parse_id(query.stream.as_deref());

    let eligible = match (selected_staff, selected_stream) {
        (Some(staff_id), Some(stream_id)) => state.store.eligible_subjects(staff_id, stream_id).await?,
        _ => Vec::new(),
    };
    let assignments = state.store.teaching_assignments(None).await?;

    let content = pages::assign_stream_page(&AssignStreamView {
        staff: &staff,
        streams: &streams,
        selected_staff,
        selected_stream,
        eligible: &eligible,
        assignments: &assignments,
    });
    Ok(render(&state, visitor, &viewer, "Assign stream", &content).await)
}

/// Handler for the assign-stream form (POST)
///
/// Only subjects the teacher is eligible for in that stream are accepted,
/// and the whole submission is rejected if any is not.
pub async fn assign_stream(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let outcome = async {
        let input = forms::assign_stream_input(&fields)?;
        let staff = state
            .store
            .staff_by_id(input.staff_id)
            .await?
            .ok_or_else(|| SchoolError::invalid("Staff: select a valid choice."))?;
        let stream = state
            .store
            .stream_by_id(input.stream_id)
            .await?
            .ok_or_else(|| SchoolError::invalid("Stream: select a valid choice."))?;

        let eligible = state.store.eligible_subjects(staff.id, stream.id).await?;
        if let Some(bad) = input
            .subject_ids
            .iter()
            .find(|id| !eligible.iter().any(|s| s.id == **id))
        {
            return Err(SchoolError::invalid(format!(
                "Subjects: select a valid choice. {bad} is not one of the available choices."
            ))
            .into());
        }

        let period = state.store.current_period().await?;
        let created = state
            .store
            .assign_subjects(
                &AssignRequest {
                    staff_id: staff.id,
                    stream_id: stream.id,
                    subject_ids: input.subject_ids.clone(),
                },
                &period,
            )
            .await?;

        Ok::<_, WebError>(format!(
            "Assigned {created} subject(s) to {} {} for {}.",
            staff.first_name,
            staff.last_name,
            stream.label()
        ))
    }
    .await;

    match outcome {
        Ok(message) => {
            Ok(flash_redirect(&state, visitor, FlashLevel::Success, message, "/assign-stream/").await)
        }
        Err(e) => bounce(&state, visitor, e, "/assign-stream/").await,
    }
}

/// A subject as returned to the assign-stream page's script.
#[derive(Debug, Serialize)]
pub struct SubjectChoice {
    pub id: i64,
    pub name: String,
}

impl From<Subject> for SubjectChoice {
    fn from(s: Subject) -> Self {
        Self { id: s.id, name: s.name }
    }
}

/// Handler for `GET /ajax/get-teacher-subjects/`
///
/// Missing or malformed ids yield an empty list.
pub async fn teacher_subjects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    Viewer::of(&state, &visitor).await?;

    let staff_id = parse_id(params.get("staff_id").map(String::as_str));
    let stream_id = parse_id(params.get("stream_id").map(String::as_str));
    let subjects: Vec<SubjectChoice> = match (staff_id, stream_id) {
        (Some(staff_id), Some(stream_id)) => state
            .store
            .eligible_subjects(staff_id, stream_id)
            .await?
            .into_iter()
            .map(SubjectChoice::from)
            .collect(),
        _ => Vec::new(),
    };

    Ok(visitor.respond(&state, Json(subjects)).await)
}
