//! Route definitions.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{academics, directory, home, homework, login, teaching};
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/healthz", get(home::healthz))
        // Login flow
        .route("/login/", get(login::login_page).post(login::login_submit))
        .route("/logout/", get(login::logout))
        // Directory
        .route("/staff/", get(directory::staff_list))
        .route(
            "/register_staff/",
            get(directory::register_staff_page).post(directory::register_staff),
        )
        .route(
            "/staff/{id}/edit/",
            get(directory::edit_staff_page).post(directory::edit_staff),
        )
        .route(
            "/staff/{id}/delete/",
            get(directory::delete_staff_page).post(directory::delete_staff),
        )
        .route("/students/", get(directory::student_list))
        .route(
            "/register_student/",
            get(directory::register_student_page).post(directory::register_student),
        )
        .route(
            "/students/{id}/edit/",
            get(directory::edit_student_page).post(directory::edit_student),
        )
        .route(
            "/students/{id}/delete/",
            get(directory::delete_student_page).post(directory::delete_student),
        )
        // Teaching assignments
        .route(
            "/assign-stream/",
            get(teaching::assign_stream_page).post(teaching::assign_stream),
        )
        .route("/ajax/get-teacher-subjects/", get(teaching::teacher_subjects))
        // Academic setup
        .route("/academics/", get(academics::academics_page))
        .route("/academics/classes/", post(academics::create_class))
        .route("/academics/streams/", post(academics::create_stream))
        .route("/academics/subjects/", post(academics::create_subject))
        .route("/academics/periods/", post(academics::create_period))
        .route("/academics/terms/", post(academics::create_term))
        // Homework
        .route(
            "/homework/",
            get(homework::homework_list).post(homework::create_homework),
        )
        .route("/homework/{id}/", get(homework::homework_detail))
        .route("/homework/{id}/submit/", post(homework::submit_homework))
        .route("/homework/{id}/deactivate/", post(homework::deactivate_homework))
        .route("/submissions/{id}/grade/", post(homework::grade_submission))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
