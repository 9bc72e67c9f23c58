//! Who is asking, and what may they do.

use acu_auth::AuthenticatedIdentity;
use acu_core::SchoolError;
use acu_store::{Staff, Student};

use crate::error::WebError;
use crate::state::AppState;
use crate::visitor::Visitor;

/// An authenticated visitor together with the person record behind their
/// email, if any.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub who: AuthenticatedIdentity,
    pub staff: Option<Staff>,
    pub student: Option<Student>,
}

impl Viewer {
    /// Resolve the visitor, or ask them to log in.
    pub async fn of(state: &AppState, visitor: &Visitor) -> Result<Self, WebError> {
        let Some(who) = visitor.identity().cloned() else {
            return Err(WebError::login_required(visitor.path.clone()));
        };

        let staff = state.store.staff_by_email(&who.email).await?;
        let student = if staff.is_none() {
            state.store.student_by_email(&who.email).await?
        } else {
            None
        };

        Ok(Self {
            who,
            staff,
            student,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.who.is_admin
    }

    /// Admins and staff run the school directory.
    pub fn can_manage(&self) -> bool {
        self.is_admin() || self.staff.is_some()
    }

    pub fn require_manager(&self) -> Result<(), WebError> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(SchoolError::denied("staff or administrator access required").into())
        }
    }

    pub fn require_staff(&self) -> Result<&Staff, WebError> {
        self.staff
            .as_ref()
            .ok_or_else(|| SchoolError::denied("only teachers can do this").into())
    }

    pub fn require_student(&self) -> Result<&Student, WebError> {
        self.student
            .as_ref()
            .ok_or_else(|| SchoolError::denied("only students can do this").into())
    }

    /// Name shown in the navigation bar.
    pub fn display_name(&self) -> String {
        match (&self.staff, &self.student) {
            (Some(s), _) => s.full_name(),
            (None, Some(s)) => s.full_name(),
            (None, None) => self.who.username.clone(),
        }
    }
}
