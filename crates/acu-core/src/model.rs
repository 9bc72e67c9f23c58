//! Small enums stored as text columns and carried in session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchoolError;

/// The kind of person record an email resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }

    /// Title-cased label used in greetings.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Staff => "Staff",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            other => Err(SchoolError::invalid(format!("unknown gender {other:?}"))),
        }
    }
}

/// What sort of homework a teacher handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HomeworkKind {
    Homework,
    HolidayAssignment,
    Project,
    Revision,
    Other,
}

impl HomeworkKind {
    pub const ALL: [HomeworkKind; 5] = [
        HomeworkKind::Homework,
        HomeworkKind::HolidayAssignment,
        HomeworkKind::Project,
        HomeworkKind::Revision,
        HomeworkKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkKind::Homework => "HOMEWORK",
            HomeworkKind::HolidayAssignment => "HOLIDAY_ASSIGNMENT",
            HomeworkKind::Project => "PROJECT",
            HomeworkKind::Revision => "REVISION",
            HomeworkKind::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HomeworkKind::Homework => "Homework",
            HomeworkKind::HolidayAssignment => "Holiday Assignment",
            HomeworkKind::Project => "Project",
            HomeworkKind::Revision => "Revision Work",
            HomeworkKind::Other => "Other",
        }
    }
}

impl FromStr for HomeworkKind {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HomeworkKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SchoolError::invalid(format!("unknown homework kind {s:?}")))
    }
}

/// Progress of one student's work on one homework item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    NotStarted,
    InProgress,
    Submitted,
    Late,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::NotStarted => "NOT_STARTED",
            SubmissionStatus::InProgress => "IN_PROGRESS",
            SubmissionStatus::Submitted => "SUBMITTED",
            SubmissionStatus::Late => "LATE",
            SubmissionStatus::Graded => "GRADED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::NotStarted => "Not Started",
            SubmissionStatus::InProgress => "In Progress",
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::Late => "Submitted Late",
            SubmissionStatus::Graded => "Graded",
        }
    }

    /// Status of a hand-in made at `submitted_at` against `due_at`.
    pub fn on_hand_in(submitted_at: DateTime<Utc>, due_at: DateTime<Utc>) -> Self {
        if submitted_at > due_at {
            SubmissionStatus::Late
        } else {
            SubmissionStatus::Submitted
        }
    }

    pub fn is_handed_in(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Submitted | SubmissionStatus::Late | SubmissionStatus::Graded
        )
    }
}

impl FromStr for SubmissionStatus {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(SubmissionStatus::NotStarted),
            "IN_PROGRESS" => Ok(SubmissionStatus::InProgress),
            "SUBMITTED" => Ok(SubmissionStatus::Submitted),
            "LATE" => Ok(SubmissionStatus::Late),
            "GRADED" => Ok(SubmissionStatus::Graded),
            other => Err(SchoolError::invalid(format!("unknown submission status {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hand_in_after_due_is_late() {
        let due = Utc::now();
        assert_eq!(
            SubmissionStatus::on_hand_in(due + Duration::minutes(1), due),
            SubmissionStatus::Late
        );
        assert_eq!(
            SubmissionStatus::on_hand_in(due, due),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn test_homework_kind_parse() {
        assert_eq!(
            "HOLIDAY_ASSIGNMENT".parse::<HomeworkKind>().unwrap(),
            HomeworkKind::HolidayAssignment
        );
        assert!("holiday".parse::<HomeworkKind>().is_err());
    }

    #[test]
    fn test_role_serde_tag() {
        let json = serde_json::to_string(&Role::Student).unwrap();
        assert_eq!(json, "\"student\"");
    }
}
