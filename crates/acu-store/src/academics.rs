//! Classes, streams, subjects and the academic calendar.

use acu_core::SchoolError;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{AcademicPeriod, Class, Stream, Subject, Term};
use crate::Store;

/// Class that owns the default subject catalogue.
pub const GENERAL_CLASS: &str = "General";

/// Curriculum subjects offered as specializations out of the box.
pub const DEFAULT_SUBJECTS: [&str; 23] = [
    "Mathematics",
    "English",
    "Kiswahili",
    "Chemistry",
    "Biology",
    "Physics",
    "History and Government",
    "Geography",
    "CRE",
    "IRE",
    "HRE",
    "Business Studies",
    "Agriculture",
    "Computer Studies",
    "Home Science",
    "Music",
    "Art and Design",
    "French",
    "German",
    "Arabic",
    "Sign Language",
    "Physical Education",
    "Life Skills",
];

pub(crate) const STREAM_SELECT: &str = "SELECT st.id, st.class_id, c.name AS class_name, st.name \
     FROM streams st JOIN classes c ON c.id = st.class_id";

pub(crate) const PERIOD_COLUMNS: &str = "id, name, start_date, end_date, is_current";
const TERM_COLUMNS: &str = "id, period_id, name, start_date, end_date, is_current";

fn required(field: &str, value: &str) -> Result<String, SchoolError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(SchoolError::invalid(format!("{field} is required.")));
    }
    Ok(v.to_string())
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Result<(), SchoolError> {
    if end < start {
        return Err(SchoolError::invalid("End date must not be before start date."));
    }
    Ok(())
}

impl Store {
    // ---------------------------------------------------------------------
    // Classes
    // ---------------------------------------------------------------------

    /// Create-or-fetch a class by name.
    pub async fn ensure_class(&self, name: &str) -> Result<Class, StoreError> {
        let name = required("Class name", name)?;
        sqlx::query("INSERT INTO classes (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(&name)
            .execute(self.pool())
            .await?;
        let class = sqlx::query_as::<_, Class>("SELECT id, name FROM classes WHERE name = ?")
            .bind(&name)
            .fetch_one(self.pool())
            .await?;
        Ok(class)
    }

    pub async fn class_by_id(&self, id: i64) -> Result<Option<Class>, StoreError> {
        let row = sqlx::query_as::<_, Class>("SELECT id, name FROM classes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, StoreError> {
        let rows = sqlx::query_as::<_, Class>("SELECT id, name FROM classes ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    // ---------------------------------------------------------------------
    // Streams
    // ---------------------------------------------------------------------

    /// Create-or-fetch a stream by (class, name).
    pub async fn ensure_stream(&self, class_id: i64, name: &str) -> Result<Stream, StoreError> {
        let name = required("Stream name", name)?;
        if self.class_by_id(class_id).await?.is_none() {
            return Err(SchoolError::not_found(format!("class {class_id}")).into());
        }
        sqlx::query(
            "INSERT INTO streams (class_id, name) VALUES (?, ?) ON CONFLICT (class_id, name) DO NOTHING",
        )
        .bind(class_id)
        .bind(&name)
        .execute(self.pool())
        .await?;

        let sql = format!("{STREAM_SELECT} WHERE st.class_id = ? AND st.name = ?");
        let stream = sqlx::query_as::<_, Stream>(&sql)
            .bind(class_id)
            .bind(&name)
            .fetch_one(self.pool())
            .await?;
        Ok(stream)
    }

    pub async fn stream_by_id(&self, id: i64) -> Result<Option<Stream>, StoreError> {
        let sql = format!("{STREAM_SELECT} WHERE st.id = ?");
        let row = sqlx::query_as::<_, Stream>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// All streams ordered by class name then stream name.
    pub async fn list_streams(&self) -> Result<Vec<Stream>, StoreError> {
        let sql = format!("{STREAM_SELECT} ORDER BY c.name, st.name");
        let rows = sqlx::query_as::<_, Stream>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    // ---------------------------------------------------------------------
    // Subjects
    // ---------------------------------------------------------------------

    /// Create-or-fetch a subject offered to `class_id`.
    pub async fn ensure_subject(&self, class_id: i64, name: &str) -> Result<Subject, StoreError> {
        let name = required("Subject name", name)?;
        if self.class_by_id(class_id).await?.is_none() {
            return Err(SchoolError::not_found(format!("class {class_id}")).into());
        }
        sqlx::query(
            "INSERT INTO subjects (class_id, name) VALUES (?, ?) ON CONFLICT (class_id, name) DO NOTHING",
        )
        .bind(class_id)
        .bind(&name)
        .execute(self.pool())
        .await?;

        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, class_id, name FROM subjects WHERE class_id = ? AND name = ?",
        )
        .bind(class_id)
        .bind(&name)
        .fetch_one(self.pool())
        .await?;
        Ok(subject)
    }

    pub async fn subject_by_id(&self, id: i64) -> Result<Option<Subject>, StoreError> {
        let row = sqlx::query_as::<_, Subject>("SELECT id, class_id, name FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query_as::<_, Subject>(
            "SELECT id, class_id, name FROM subjects ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Make sure the default catalogue exists under the "General" class.
    ///
    /// Returns how many subjects were missing and got created.
    pub async fn ensure_default_subjects(&self) -> Result<u64, StoreError> {
        let general = self.ensure_class(GENERAL_CLASS).await?;
        let mut tx = self.pool().begin().await?;
        let mut created = 0;
        for name in DEFAULT_SUBJECTS {
            let res = sqlx::query(
                "INSERT INTO subjects (class_id, name) VALUES (?, ?) ON CONFLICT (class_id, name) DO NOTHING",
            )
            .bind(general.id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
            created += res.rows_affected();
        }
        tx.commit().await?;

        if created > 0 {
            tracing::info!(created, "default subjects seeded");
        }
        Ok(created)
    }

    // ---------------------------------------------------------------------
    // Academic periods and terms
    // ---------------------------------------------------------------------

    /// Create-or-fetch an academic period by name.
    ///
    /// Flagging a period current clears the flag on every other period.
    pub async fn create_period(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_current: bool,
    ) -> Result<AcademicPeriod, StoreError> {
        let name = required("Year name", name)?;
        date_range(start_date, end_date)?;

        let mut tx = self.pool().begin().await?;
        if is_current {
            sqlx::query("UPDATE academic_periods SET is_current = 0 WHERE name <> ?")
                .bind(&name)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            "INSERT INTO academic_periods (name, start_date, end_date, is_current) \
             VALUES (?, ?, ?, ?) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&name)
        .bind(start_date)
        .bind(end_date)
        .bind(is_current)
        .execute(&mut *tx)
        .await?;
        let sql = format!("SELECT {PERIOD_COLUMNS} FROM academic_periods WHERE name = ?");
        let period = sqlx::query_as::<_, AcademicPeriod>(&sql)
            .bind(&name)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(period_id = period.id, name = %period.name, "academic period ensured");
        Ok(period)
    }

    pub async fn list_periods(&self) -> Result<Vec<AcademicPeriod>, StoreError> {
        let sql = format!("SELECT {PERIOD_COLUMNS} FROM academic_periods ORDER BY start_date DESC, id DESC");
        let rows = sqlx::query_as::<_, AcademicPeriod>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Create-or-fetch a term by (period, name).
    pub async fn create_term(
        &self,
        period_id: i64,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_current: bool,
    ) -> Result<Term, StoreError> {
        let name = required("Term name", name)?;
        date_range(start_date, end_date)?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM academic_periods WHERE id = ?")
            .bind(period_id)
            .fetch_optional(self.pool())
            .await?;
        if exists.is_none() {
            return Err(SchoolError::not_found(format!("academic period {period_id}")).into());
        }

        sqlx::query(
            "INSERT INTO terms (period_id, name, start_date, end_date, is_current) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT (period_id, name) DO NOTHING",
        )
        .bind(period_id)
        .bind(&name)
        .bind(start_date)
        .bind(end_date)
        .bind(is_current)
        .execute(self.pool())
        .await?;

        let sql = format!("SELECT {TERM_COLUMNS} FROM terms WHERE period_id = ? AND name = ?");
        let term = sqlx::query_as::<_, Term>(&sql)
            .bind(period_id)
            .bind(&name)
            .fetch_one(self.pool())
            .await?;
        Ok(term)
    }

    pub async fn term_by_id(&self, id: i64) -> Result<Option<Term>, StoreError> {
        let sql = format!("SELECT {TERM_COLUMNS} FROM terms WHERE id = ?");
        let row = sqlx::query_as::<_, Term>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_terms(&self) -> Result<Vec<Term>, StoreError> {
        let sql = format!("SELECT {TERM_COLUMNS} FROM terms ORDER BY start_date DESC, id DESC");
        let rows = sqlx::query_as::<_, Term>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }
}
