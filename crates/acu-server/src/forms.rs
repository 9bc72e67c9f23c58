//! Form decoding.
//!
//! HTML forms repeat a field name for multi-selects (`subjects=1&subjects=4`),
//! which `axum::Form` cannot express, so multi-value forms are decoded into
//! [`FormFields`] and converted to store payloads here.

use acu_core::{Gender, HomeworkKind, SchoolError};
use acu_store::{HomeworkDraft, StaffDraft, StudentDraft};
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::WebError;

/// Raw `application/x-www-form-urlencoded` pairs in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value of `name`, trimmed; empty if absent.
    pub fn get(&self, name: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .unwrap_or("")
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        Some(self.get(name))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Checkbox semantics: present and not "off"/"false".
    pub fn flag(&self, name: &str) -> bool {
        !matches!(self.get(name), "" | "off" | "false")
    }

    pub fn required(&self, name: &str, label: &str) -> Result<String, SchoolError> {
        self.optional(name)
            .ok_or_else(|| SchoolError::invalid(format!("{label}: this field is required.")))
    }

    /// A required choice among database ids.
    pub fn id(&self, name: &str, label: &str) -> Result<i64, SchoolError> {
        let raw = self.required(name, label)?;
        raw.parse()
            .map_err(|_| SchoolError::invalid(format!("{label}: select a valid choice.")))
    }

    pub fn optional_id(&self, name: &str, label: &str) -> Result<Option<i64>, SchoolError> {
        match self.optional(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| SchoolError::invalid(format!("{label}: select a valid choice."))),
        }
    }

    /// Every value of a repeated id field, in submission order.
    pub fn ids(&self, name: &str, label: &str) -> Result<Vec<i64>, SchoolError> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| {
                v.trim()
                    .parse()
                    .map_err(|_| SchoolError::invalid(format!("{label}: select a valid choice.")))
            })
            .collect()
    }

    fn gender(&self) -> Result<Gender, SchoolError> {
        self.required("gender", "Gender")?.parse()
    }

    fn date(&self, name: &str, label: &str) -> Result<NaiveDate, SchoolError> {
        let raw = self.required(name, label)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| SchoolError::invalid(format!("{label}: enter a valid date.")))
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| WebError::BadRequest(e.body_text()))?;
        Ok(Self::parse(&body))
    }
}

pub fn staff_draft(f: &FormFields) -> Result<StaffDraft, SchoolError> {
    Ok(StaffDraft {
        first_name: f.get("first_name").to_string(),
        last_name: f.get("last_name").to_string(),
        email: f.get("email").to_lowercase(),
        gender: f.gender()?,
        position: f.get("position").to_string(),
        department: f.get("department").to_string(),
        address: f.get("address").to_string(),
        phone: f.optional("phone"),
        specializations: f.ids("specializations", "Subject specialization")?,
    })
}

pub fn student_draft(f: &FormFields) -> Result<StudentDraft, SchoolError> {
    Ok(StudentDraft {
        admission_number: f.get("admission_number").to_string(),
        first_name: f.get("first_name").to_string(),
        last_name: f.get("last_name").to_string(),
        email: f.optional("email").map(|e| e.to_lowercase()),
        gender: f.gender()?,
        class_id: f.id("class", "Class")?,
        stream_id: f.id("stream", "Stream")?,
        address: f.get("address").to_string(),
        phone: f.optional("phone"),
    })
}

/// The assign-stream form before it is checked against the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignStreamInput {
    pub staff_id: i64,
    pub stream_id: i64,
    pub subject_ids: Vec<i64>,
}

pub fn assign_stream_input(f: &FormFields) -> Result<AssignStreamInput, SchoolError> {
    let staff_id = f.id("staff", "Staff")?;
    let stream_id = f.id("stream", "Stream")?;
    let subject_ids = f.ids("subjects", "Subjects")?;
    if subject_ids.is_empty() {
        return Err(SchoolError::invalid("Subjects: this field is required."));
    }
    Ok(AssignStreamInput {
        staff_id,
        stream_id,
        subject_ids,
    })
}

pub struct PeriodInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

pub fn period_input(f: &FormFields) -> Result<PeriodInput, SchoolError> {
    Ok(PeriodInput {
        name: f.required("name", "Name")?,
        start_date: f.date("start_date", "Start date")?,
        end_date: f.date("end_date", "End date")?,
        is_current: f.flag("is_current"),
    })
}

pub fn homework_draft(f: &FormFields) -> Result<HomeworkDraft, SchoolError> {
    let kind = match f.optional("kind") {
        Some(k) => k.parse()?,
        None => HomeworkKind::Homework,
    };
    let total_marks = match f.optional("total_marks") {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| SchoolError::invalid("Total marks: enter a number."))?,
        None => 0.0,
    };
    Ok(HomeworkDraft {
        title: f.required("title", "Title")?,
        description: f.get("description").to_string(),
        kind,
        subject_id: f.id("subject", "Subject")?,
        stream_id: f.id("stream", "Stream")?,
        term_id: f.optional_id("term", "Term")?,
        total_marks,
        due_at: parse_due(&f.required("due_at", "Due date")?)?,
    })
}

/// `<input type="datetime-local">` value, taken as UTC.
fn parse_due(raw: &str) -> Result<DateTime<Utc>, SchoolError> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SchoolError::invalid("Due date: enter a valid date and time."))
}
