//! Homework: setting it, handing it in and grading it.

use acu_auth::FlashLevel;
use acu_core::SchoolError;
use acu_store::{Homework, Submission};
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;

use crate::access::Viewer;
use crate::error::WebError;
use crate::forms::{self, FormFields};
use crate::handlers::{bounce, flash_redirect, found, render};
use crate::pages::{self, HomeworkRow};
use crate::state::AppState;
use crate::visitor::Visitor;

/// Attach subject and stream names for display.
async fn describe(
    state: &AppState,
    homework: Homework,
    submission: Option<Submission>,
) -> Result<HomeworkRow, WebError> {
    let subject = state
        .store
        .subject_by_id(homework.subject_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_default();
    let stream = state
        .store
        .stream_by_id(homework.stream_id)
        .await?
        .map(|s| s.label())
        .unwrap_or_default();
    Ok(HomeworkRow {
        homework,
        subject,
        stream,
        submission,
    })
}

/// Handler for `GET /homework/`: what a teacher has set, or what a student
/// has to do.
pub async fn homework_list(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let now = Utc::now();

    let content = if let Some(staff) = &viewer.staff {
        let mut rows = Vec::new();
        for hw in state.store.homework_by_staff(staff.id).await? {
            rows.push(describe(&state, hw, None).await?);
        }
        let teaching = state.store.teaching_assignments(Some(staff.id)).await?;
        let terms = state.store.list_terms().await?;
        pages::staff_homework_page(&rows, &teaching, &terms, now)
    } else if let Some(student) = &viewer.student {
        let mut rows = Vec::new();
        for hw in state.store.homework_for_stream(student.stream_id).await? {
            let mine = state.store.submission_for(hw.id, student.id).await?;
            rows.push(describe(&state, hw, mine).await?);
        }
        pages::student_homework_page(&rows, now)
    } else {
        return Err(SchoolError::denied("homework is for teachers and students").into());
    };

    Ok(render(&state, visitor, &viewer, "Homework", &content).await)
}

/// Handler for `POST /homework/`
pub async fn create_homework(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let staff = viewer.require_staff()?;

    let outcome = async {
        let draft = forms::homework_draft(&fields)?;
        Ok::<_, WebError>(state.store.create_homework(staff.id, &draft, Utc::now()).await?)
    }
    .await;

    match outcome {
        Ok(hw) => Ok(flash_redirect(
            &state,
            visitor,
            FlashLevel::Success,
            "Homework created successfully.",
            &format!("/homework/{}/", hw.id),
        )
        .await),
        Err(e) => bounce(&state, visitor, e, "/homework/").await,
    }
}

/// Handler for `GET /homework/{id}/`
///
/// The author sees every hand-in; a student of the stream sees the task and
/// their own work.
pub async fn homework_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let now = Utc::now();
    let hw = found(state.store.homework_by_id(id).await?, || format!("homework {id}"))?;
    let title = hw.title.clone();

    let content = match (&viewer.staff, &viewer.student) {
        (Some(staff), _) if staff.id == hw.created_by => {
            let mut submissions = Vec::new();
            for s in state.store.submissions_for_homework(hw.id).await? {
                let name = state
                    .store
                    .student_by_id(s.student_id)
                    .await?
                    .map(|st| st.full_name())
                    .unwrap_or_default();
                submissions.push((s, name));
            }
            let row = describe(&state, hw, None).await?;
            pages::homework_review_page(&row, &submissions, now)
        }
        (None, Some(student)) if student.stream_id == hw.stream_id => {
            if !hw.is_active {
                return Err(SchoolError::not_found(format!("homework {id}")).into());
            }
            let mine = state.store.submission_for(hw.id, student.id).await?;
            let row = describe(&state, hw, mine).await?;
            pages::homework_submit_page(&row, now)
        }
        _ => return Err(SchoolError::denied("this homework is not yours to view").into()),
    };

    Ok(render(&state, visitor, &viewer, &title, &content).await)
}

/// Handler for `POST /homework/{id}/submit/`
pub async fn submit_homework(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let student = viewer.require_student()?;
    let back = format!("/homework/{id}/");

    match state
        .store
        .submit_homework(id, student.id, fields.get("body"), Utc::now())
        .await
    {
        Ok(_) => {
            Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Homework submitted successfully.", &back).await)
        }
        Err(e) => bounce(&state, visitor, e.into(), &back).await,
    }
}

/// Handler for `POST /homework/{id}/deactivate/`
pub async fn deactivate_homework(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let staff = viewer.require_staff()?;

    state.store.deactivate_homework(id, staff.id).await?;
    Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Homework withdrawn.", "/homework/").await)
}

/// Handler for `POST /submissions/{id}/grade/`
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    let staff = viewer.require_staff()?;
    let submission = found(state.store.submission_by_id(id).await?, || format!("submission {id}"))?;
    let back = format!("/homework/{}/", submission.homework_id);

    let outcome = async {
        let marks = fields
            .required("marks", "Marks")?
            .parse::<f64>()
            .map_err(|_| SchoolError::invalid("Marks: enter a number."))?;
        let remarks = fields.optional("remarks");
        Ok::<_, WebError>(
            state
                .store
                .grade_submission(id, staff.id, marks, remarks.as_deref(), Utc::now())
                .await?,
        )
    }
    .await;

    match outcome {
        Ok(_) => Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Submission graded.", &back).await),
        Err(e) => bounce(&state, visitor, e, &back).await,
    }
}
