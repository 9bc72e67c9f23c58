//! Row types and insert payloads.

use acu_core::{Gender, HomeworkKind, LetterGrade, SubmissionStatus, percentage};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: i64,
    pub username: String,      // login handle, e.g. "alice1"
    pub email: String,         // lower-cased
    pub password_hash: String, // Argon2 PHC string
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Staff {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub position: String,
    pub department: String,
    pub address: String,
    pub phone: Option<String>,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Staff registration or edit payload.
#[derive(Debug, Clone)]
pub struct StaffDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub position: String,
    pub department: String,
    pub address: String,
    pub phone: Option<String>,
    /// Subject ids; replaces the whole specialization set on save.
    pub specializations: Vec<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: i64,
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub gender: String,
    pub class_id: i64,
    pub stream_id: i64,
    pub address: String,
    pub phone: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct StudentDraft {
    pub admission_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub gender: Gender,
    pub class_id: i64,
    pub stream_id: i64,
    pub address: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
}

/// A stream together with the name of its class.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stream {
    pub id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub name: String,
}

impl Stream {
    /// Display label, e.g. "Grade 7 East".
    pub fn label(&self) -> String {
        format!("{} {}", self.class_name, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Subject {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AcademicPeriod {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Term {
    pub id: i64,
    pub period_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TeachingAssignment {
    pub id: i64,
    pub staff_id: i64,
    pub subject_id: i64,
    pub stream_id: i64,
    pub period_id: i64,
}

/// Teaching assignment joined with display names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeachingAssignmentRow {
    pub id: i64,
    pub staff_id: i64,
    pub staff_name: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub stream_id: i64,
    pub stream_label: String,
    pub period_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Homework {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub subject_id: i64,
    pub stream_id: i64,
    pub term_id: Option<i64>,
    pub created_by: i64,
    pub total_marks: f64,
    pub due_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Homework {
    pub fn kind(&self) -> HomeworkKind {
        self.kind.parse().unwrap_or(HomeworkKind::Other)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }

    /// Whole days left before the due date; zero once it has passed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if now < self.due_at {
            (self.due_at - now).num_days()
        } else {
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeworkDraft {
    pub title: String,
    pub description: String,
    pub kind: HomeworkKind,
    pub subject_id: i64,
    pub stream_id: i64,
    pub term_id: Option<i64>,
    pub total_marks: f64,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: i64,
    pub homework_id: i64,
    pub student_id: i64,
    pub status: String,
    pub body: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub marks: Option<f64>,
    pub remarks: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn status(&self) -> SubmissionStatus {
        self.status.parse().unwrap_or(SubmissionStatus::NotStarted)
    }

    pub fn percentage(&self, total_marks: f64) -> Option<f64> {
        self.marks.and_then(|m| percentage(m, total_marks))
    }

    pub fn letter_grade(&self, total_marks: f64) -> Option<LetterGrade> {
        self.percentage(total_marks).map(LetterGrade::from_percentage)
    }
}
