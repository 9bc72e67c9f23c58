//! Staff and student registration, editing and removal.

use acu_auth::FlashLevel;
use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::access::Viewer;
use crate::error::WebError;
use crate::forms::{self, FormFields};
use crate::handlers::{bounce, flash_redirect, found, render};
use crate::pages;
use crate::state::AppState;
use crate::visitor::Visitor;

// =============================================================================
// Staff
// =============================================================================

pub async fn staff_list(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let staff = state.store.list_staff().await?;
    let content = pages::staff_list_page(&staff);
    Ok(render(&state, visitor, &viewer, "Staff", &content).await)
}

pub async fn register_staff_page(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    state.store.ensure_default_subjects().await?;
    let subjects = state.store.list_subjects().await?;
    let content = pages::staff_form_page("/register_staff/", None, &[], &subjects);
    Ok(render(&state, visitor, &viewer, "Register staff", &content).await)
}

pub async fn register_staff(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let outcome = async {
        let draft = forms::staff_draft(&fields)?;
        Ok::<_, WebError>(state.store.register_staff(&draft).await?)
    }
    .await;

    match outcome {
        Ok(_) => Ok(flash_redirect(
            &state,
            visitor,
            FlashLevel::Success,
            "Staff member registered successfully!",
            "/staff/",
        )
        .await),
        Err(e) => bounce(&state, visitor, e, "/register_staff/").await,
    }
}

pub async fn edit_staff_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let staff = found(state.store.staff_by_id(id).await?, || format!("staff {id}"))?;
    state.store.ensure_default_subjects().await?;
    let subjects = state.store.list_subjects().await?;
    let chosen: Vec<i64> = state
        .store
        .specializations(id)
        .await?
        .iter()
        .map(|s| s.id)
        .collect();

    let action = format!("/staff/{id}/edit/");
    let content = pages::staff_form_page(&action, Some(&staff), &chosen, &subjects);
    Ok(render(&state, visitor, &viewer, "Edit staff", &content).await)
}

pub async fn edit_staff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let outcome = async {
        let draft = forms::staff_draft(&fields)?;
        Ok::<_, WebError>(state.store.update_staff(id, &draft).await?)
    }
    .await;

    match outcome {
        Ok(_) => {
            Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Staff updated successfully.", "/staff/").await)
        }
        Err(e) => bounce(&state, visitor, e, &format!("/staff/{id}/edit/")).await,
    }
}

pub async fn delete_staff_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let staff = found(state.store.staff_by_id(id).await?, || format!("staff {id}"))?;
    let content = pages::confirm_delete_page(&staff.full_name(), &format!("/staff/{id}/delete/"), "/staff/");
    Ok(render(&state, visitor, &viewer, "Delete staff", &content).await)
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    state.store.delete_staff(id).await?;
    Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Staff deleted successfully.", "/staff/").await)
}

// =============================================================================
// Students
// =============================================================================

pub async fn student_list(State(state): State<AppState>, visitor: Visitor) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let students = state.store.list_students().await?;
    let streams = state.store.list_streams().await?;
    let content = pages::student_list_page(&students, &streams);
    Ok(render(&state, visitor, &viewer, "Students", &content).await)
}

pub async fn register_student_page(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let classes = state.store.list_classes().await?;
    let streams = state.store.list_streams().await?;
    let content = pages::student_form_page("/register_student/", None, &classes, &streams);
    Ok(render(&state, visitor, &viewer, "Register student", &content).await)
}

pub async fn register_student(
    State(state): State<AppState>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let outcome = async {
        let draft = forms::student_draft(&fields)?;
        Ok::<_, WebError>(state.store.register_student(&draft).await?)
    }
    .await;

    match outcome {
        Ok(_) => Ok(flash_redirect(
            &state,
            visitor,
            FlashLevel::Success,
            "Student registered successfully!",
            "/students/",
        )
        .await),
        Err(e) => bounce(&state, visitor, e, "/register_student/").await,
    }
}

pub async fn edit_student_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let student = found(state.store.student_by_id(id).await?, || format!("student {id}"))?;
    let classes = state.store.list_classes().await?;
    let streams = state.store.list_streams().await?;

    let action = format!("/students/{id}/edit/");
    let content = pages::student_form_page(&action, Some(&student), &classes, &streams);
    Ok(render(&state, visitor, &viewer, "Edit student", &content).await)
}

pub async fn edit_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
    fields: FormFields,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let outcome = async {
        let draft = forms::student_draft(&fields)?;
        Ok::<_, WebError>(state.store.update_student(id, &draft).await?)
    }
    .await;

    match outcome {
        Ok(_) => Ok(flash_redirect(
            &state,
            visitor,
            FlashLevel::Success,
            "Student updated successfully.",
            "/students/",
        )
        .await),
        Err(e) => bounce(&state, visitor, e, &format!("/students/{id}/edit/")).await,
    }
}

pub async fn delete_student_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    let student = found(state.store.student_by_id(id).await?, || format!("student {id}"))?;
    let content =
        pages::confirm_delete_page(&student.full_name(), &format!("/students/{id}/delete/"), "/students/");
    Ok(render(&state, visitor, &viewer, "Delete student", &content).await)
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    visitor: Visitor,
) -> Result<Response, WebError> {
    let viewer = Viewer::of(&state, &visitor).await?;
    viewer.require_manager()?;

    state.store.delete_student(id).await?;
    Ok(flash_redirect(&state, visitor, FlashLevel::Success, "Student deleted successfully.", "/students/").await)
}
