//! Teaching eligibility and teaching assignments.
//!
//! A teacher may be linked to a subject in a stream when the subject is
//! offered to the stream's class and the teacher specializes in it. The
//! eligibility query only populates forms; [`Store::assign_subjects`] itself
//! does not re-check it.

use acu_core::SchoolError;
use std::collections::BTreeSet;

use crate::academics::PERIOD_COLUMNS;
use crate::error::StoreError;
use crate::models::{AcademicPeriod, Subject, TeachingAssignmentRow};
use crate::Store;

/// Link one teacher to a set of subjects within one stream.
#[derive(Debug, Clone)]
pub struct AssignRequest {
    pub staff_id: i64,
    pub stream_id: i64,
    pub subject_ids: Vec<i64>,
}

impl Store {
    /// Subjects of the stream's class that the teacher specializes in,
    /// ordered by name.
    ///
    /// Unknown teacher or stream ids yield an empty list.
    pub async fn eligible_subjects(
        &self,
        staff_id: i64,
        stream_id: i64,
    ) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query_as::<_, Subject>(
            "SELECT s.id, s.class_id, s.name FROM subjects s \
             JOIN streams st ON st.class_id = s.class_id \
             JOIN staff_specializations sp ON sp.subject_id = s.id \
             WHERE st.id = ? AND sp.staff_id = ? \
             ORDER BY s.name, s.id",
        )
        .bind(stream_id)
        .bind(staff_id)
        .fetch_all(self.pool())
        .await?;

        tracing::debug!(staff_id, stream_id, eligible = rows.len(), "eligible subjects computed");
        Ok(rows)
    }

    /// The period flagged current, else the one that started last.
    pub async fn current_period(&self) -> Result<AcademicPeriod, StoreError> {
        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM academic_periods WHERE is_current = 1 ORDER BY id LIMIT 1"
        );
        if let Some(period) = sqlx::query_as::<_, AcademicPeriod>(&sql)
            .fetch_optional(self.pool())
            .await?
        {
            return Ok(period);
        }

        let sql = format!(
            "SELECT {PERIOD_COLUMNS} FROM academic_periods ORDER BY start_date DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, AcademicPeriod>(&sql)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| SchoolError::NoAcademicPeriod.into())
    }

    /// Create-or-fetch one assignment per subject for `period`.
    ///
    /// Returns how many tuples were newly created; tuples that already
    /// existed count as zero. Repeated subject ids are collapsed.
    pub async fn assign_subjects(
        &self,
        request: &AssignRequest,
        period: &AcademicPeriod,
    ) -> Result<u64, StoreError> {
        let subjects: BTreeSet<i64> = request.subject_ids.iter().copied().collect();

        let mut tx = self.pool().begin().await?;
        let mut created = 0;
        for subject_id in &subjects {
            let res = sqlx::query(
                "INSERT INTO teaching_assignments (staff_id, subject_id, stream_id, period_id) \
                 VALUES (?, ?, ?, ?) \
                 ON CONFLICT (staff_id, subject_id, stream_id, period_id) DO NOTHING",
            )
            .bind(request.staff_id)
            .bind(subject_id)
            .bind(request.stream_id)
            .bind(period.id)
            .execute(&mut *tx)
            .await?;
            created += res.rows_affected();
        }
        tx.commit().await?;

        tracing::info!(
            staff_id = request.staff_id,
            stream_id = request.stream_id,
            period = %period.name,
            requested = subjects.len(),
            created,
            "teaching assignments recorded"
        );
        Ok(created)
    }

    pub async fn is_assigned(
        &self,
        staff_id: i64,
        subject_id: i64,
        stream_id: i64,
        period_id: i64,
    ) -> Result<bool, StoreError> {
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(1) FROM teaching_assignments \
             WHERE staff_id = ? AND subject_id = ? AND stream_id = ? AND period_id = ?",
        )
        .bind(staff_id)
        .bind(subject_id)
        .bind(stream_id)
        .bind(period_id)
        .fetch_one(self.pool())
        .await?;
        Ok(n > 0)
    }

    /// Assignments with display names, optionally limited to one teacher.
    pub async fn teaching_assignments(
        &self,
        staff_id: Option<i64>,
    ) -> Result<Vec<TeachingAssignmentRow>, StoreError> {
        let rows = sqlx::query_as::<_, TeachingAssignmentRow>(
            "SELECT ta.id, ta.staff_id, \
                    sf.first_name || ' ' || sf.last_name AS staff_name, \
                    ta.subject_id, su.name AS subject_name, \
                    ta.stream_id, c.name || ' ' || st.name AS stream_label, \
                    ap.name AS period_name \
             FROM teaching_assignments ta \
             JOIN staff sf ON sf.id = ta.staff_id \
             JOIN subjects su ON su.id = ta.subject_id \
             JOIN streams st ON st.id = ta.stream_id \
             JOIN classes c ON c.id = st.class_id \
             JOIN academic_periods ap ON ap.id = ta.period_id \
             WHERE (?1 IS NULL OR ta.staff_id = ?1) \
             ORDER BY ap.start_date DESC, stream_label, subject_name",
        )
        .bind(staff_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
