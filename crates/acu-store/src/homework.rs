//! Homework handed out by teachers and the students' hand-ins.

use acu_core::{SchoolError, SubmissionStatus};
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Homework, HomeworkDraft, Submission};
use crate::Store;

const HOMEWORK_COLUMNS: &str = "id, title, description, kind, subject_id, stream_id, term_id, \
     created_by, total_marks, due_at, is_active, created_at";
const SUBMISSION_COLUMNS: &str = "id, homework_id, student_id, status, body, submitted_at, \
     marks, remarks, graded_by, graded_at";

impl Store {
    /// Record new homework set by `staff_id`.
    ///
    /// The teacher must hold a teaching assignment for the subject and stream
    /// in the current academic period.
    pub async fn create_homework(
        &self,
        staff_id: i64,
        draft: &HomeworkDraft,
        now: DateTime<Utc>,
    ) -> Result<Homework, StoreError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(SchoolError::invalid("Title is required.").into());
        }
        if !draft.total_marks.is_finite() || draft.total_marks < 0.0 {
            return Err(SchoolError::invalid("Total marks cannot be negative.").into());
        }
        if let Some(term_id) = draft.term_id {
            if self.term_by_id(term_id).await?.is_none() {
                return Err(SchoolError::not_found(format!("term {term_id}")).into());
            }
        }

        let period = self.current_period().await?;
        if !self
            .is_assigned(staff_id, draft.subject_id, draft.stream_id, period.id)
            .await?
        {
            return Err(SchoolError::denied(
                "you do not teach this subject in this stream this year",
            )
            .into());
        }

        let sql = format!(
            "INSERT INTO homework (title, description, kind, subject_id, stream_id, term_id, \
             created_by, total_marks, due_at, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?) RETURNING {HOMEWORK_COLUMNS}"
        );
        let homework = sqlx::query_as::<_, Homework>(&sql)
            .bind(title)
            .bind(draft.description.trim())
            .bind(draft.kind.as_str())
            .bind(draft.subject_id)
            .bind(draft.stream_id)
            .bind(draft.term_id)
            .bind(staff_id)
            .bind(draft.total_marks)
            .bind(draft.due_at)
            .bind(now)
            .fetch_one(self.pool())
            .await?;

        tracing::info!(
            homework_id = homework.id,
            staff_id,
            stream_id = homework.stream_id,
            "homework created"
        );
        Ok(homework)
    }

    pub async fn homework_by_id(&self, id: i64) -> Result<Option<Homework>, StoreError> {
        let sql = format!("SELECT {HOMEWORK_COLUMNS} FROM homework WHERE id = ?");
        let row = sqlx::query_as::<_, Homework>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Active homework for a stream, latest due date first.
    pub async fn homework_for_stream(&self, stream_id: i64) -> Result<Vec<Homework>, StoreError> {
        let sql = format!(
            "SELECT {HOMEWORK_COLUMNS} FROM homework WHERE stream_id = ? AND is_active = 1 \
             ORDER BY due_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, Homework>(&sql)
            .bind(stream_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Everything a teacher has set, active or not.
    pub async fn homework_by_staff(&self, staff_id: i64) -> Result<Vec<Homework>, StoreError> {
        let sql = format!(
            "SELECT {HOMEWORK_COLUMNS} FROM homework WHERE created_by = ? ORDER BY due_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, Homework>(&sql)
            .bind(staff_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Hide homework from students. Only its author may do this.
    pub async fn deactivate_homework(&self, id: i64, staff_id: i64) -> Result<(), StoreError> {
        let homework = self.owned_homework(id, staff_id).await?;
        sqlx::query("UPDATE homework SET is_active = 0 WHERE id = ?")
            .bind(homework.id)
            .execute(self.pool())
            .await?;
        tracing::info!(homework_id = id, staff_id, "homework deactivated");
        Ok(())
    }

    async fn owned_homework(&self, id: i64, staff_id: i64) -> Result<Homework, StoreError> {
        let homework = self
            .homework_by_id(id)
            .await?
            .ok_or_else(|| SchoolError::not_found(format!("homework {id}")))?;
        if homework.created_by != staff_id {
            return Err(SchoolError::denied("only the teacher who set this homework may change it").into());
        }
        Ok(homework)
    }

    /// Hand in (or re-hand in) a student's work.
    ///
    /// Work handed in after the due time is marked late. Graded work is
    /// frozen.
    pub async fn submit_homework(
        &self,
        homework_id: i64,
        student_id: i64,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Submission, StoreError> {
        let homework = self
            .homework_by_id(homework_id)
            .await?
            .filter(|h| h.is_active)
            .ok_or_else(|| SchoolError::not_found(format!("homework {homework_id}")))?;
        let student = self
            .student_by_id(student_id)
            .await?
            .ok_or_else(|| SchoolError::not_found(format!("student {student_id}")))?;
        if student.stream_id != homework.stream_id {
            return Err(SchoolError::denied("this homework was not set for your stream").into());
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(SchoolError::invalid("Submission text is required.").into());
        }

        let status = SubmissionStatus::on_hand_in(now, homework.due_at);
        let sql = format!(
            "INSERT INTO homework_submissions (homework_id, student_id, status, body, submitted_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (homework_id, student_id) DO UPDATE SET \
                status = excluded.status, body = excluded.body, submitted_at = excluded.submitted_at \
             WHERE homework_submissions.status <> 'GRADED' \
             RETURNING {SUBMISSION_COLUMNS}"
        );
        let submission = sqlx::query_as::<_, Submission>(&sql)
            .bind(homework_id)
            .bind(student_id)
            .bind(status.as_str())
            .bind(body)
            .bind(now)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| SchoolError::invalid("This work has already been graded."))?;

        tracing::info!(
            homework_id,
            student_id,
            status = status.as_str(),
            "homework handed in"
        );
        Ok(submission)
    }

    /// Mark a handed-in submission. Only the homework's author may grade.
    pub async fn grade_submission(
        &self,
        submission_id: i64,
        staff_id: i64,
        marks: f64,
        remarks: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Submission, StoreError> {
        let submission = self
            .submission_by_id(submission_id)
            .await?
            .ok_or_else(|| SchoolError::not_found(format!("submission {submission_id}")))?;
        let homework = self.owned_homework(submission.homework_id, staff_id).await?;

        if !submission.status().is_handed_in() {
            return Err(SchoolError::invalid("Nothing has been handed in yet.").into());
        }
        if !marks.is_finite() || marks < 0.0 || marks > homework.total_marks {
            return Err(SchoolError::invalid(format!(
                "Marks must be between 0 and {}.",
                homework.total_marks
            ))
            .into());
        }
        let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());

        let sql = format!(
            "UPDATE homework_submissions SET status = ?, marks = ?, remarks = ?, graded_by = ?, \
             graded_at = ? WHERE id = ? RETURNING {SUBMISSION_COLUMNS}"
        );
        let graded = sqlx::query_as::<_, Submission>(&sql)
            .bind(SubmissionStatus::Graded.as_str())
            .bind(marks)
            .bind(remarks)
            .bind(staff_id)
            .bind(now)
            .bind(submission_id)
            .fetch_one(self.pool())
            .await?;

        tracing::info!(submission_id, staff_id, marks, "submission graded");
        Ok(graded)
    }

    pub async fn submission_by_id(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM homework_submissions WHERE id = ?");
        let row = sqlx::query_as::<_, Submission>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn submission_for(
        &self,
        homework_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM homework_submissions WHERE homework_id = ? AND student_id = ?"
        );
        let row = sqlx::query_as::<_, Submission>(&sql)
            .bind(homework_id)
            .bind(student_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn submissions_for_homework(
        &self,
        homework_id: i64,
    ) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM homework_submissions WHERE homework_id = ? \
             ORDER BY submitted_at, id"
        );
        let rows = sqlx::query_as::<_, Submission>(&sql)
            .bind(homework_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StaffDraft, StudentDraft};
    use crate::teaching::AssignRequest;
    use acu_core::{Gender, HomeworkKind, LetterGrade};
    use chrono::{Duration, NaiveDate, TimeZone};

    struct Fixture {
        store: Store,
        teacher: i64,
        other_teacher: i64,
        student: i64,
        subject: i64,
        stream: i64,
    }

    fn staff(email: &str, subjects: Vec<i64>) -> StaffDraft {
        StaffDraft {
            first_name: "Jane".into(),
            last_name: "Wanjiru".into(),
            email: email.into(),
            gender: Gender::Female,
            position: "Teacher".into(),
            department: "Sciences".into(),
            address: "Nakuru".into(),
            phone: None,
            specializations: subjects,
        }
    }

    async fn fixture() -> Fixture {
        let store = Store::in_memory().await.unwrap();
        let class = store.ensure_class("Grade 8").await.unwrap();
        let stream = store.ensure_stream(class.id, "North").await.unwrap();
        let subject = store.ensure_subject(class.id, "Science").await.unwrap();
        let teacher = store
            .register_staff(&staff("jane@school.ac.ke", vec![subject.id]))
            .await
            .unwrap();
        let other = store
            .register_staff(&staff("otieno@school.ac.ke", vec![subject.id]))
            .await
            .unwrap();
        let student = store
            .register_student(&StudentDraft {
                admission_number: "ADM-001".into(),
                first_name: "Amani".into(),
                last_name: "Kiprop".into(),
                email: Some("amani@school.ac.ke".into()),
                gender: Gender::Male,
                class_id: class.id,
                stream_id: stream.id,
                address: "Eldoret".into(),
                phone: None,
            })
            .await
            .unwrap();

        let period = store
            .create_period(
                "2025",
                NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(),
                true,
            )
            .await
            .unwrap();
        store
            .assign_subjects(
                &AssignRequest {
                    staff_id: teacher.id,
                    stream_id: stream.id,
                    subject_ids: vec![subject.id],
                },
                &period,
            )
            .await
            .unwrap();

        Fixture {
            store,
            teacher: teacher.id,
            other_teacher: other.id,
            student: student.id,
            subject: subject.id,
            stream: stream.id,
        }
    }

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 17, 0, 0).unwrap()
    }

    fn draft(f: &Fixture) -> HomeworkDraft {
        HomeworkDraft {
            title: "Photosynthesis".into(),
            description: "Describe the light reaction.".into(),
            kind: HomeworkKind::Homework,
            subject_id: f.subject,
            stream_id: f.stream,
            term_id: None,
            total_marks: 20.0,
            due_at: due(),
        }
    }

    #[tokio::test]
    async fn test_only_assigned_teacher_sets_homework() {
        let f = fixture().await;
        let now = due() - Duration::days(7);

        let hw = f.store.create_homework(f.teacher, &draft(&f), now).await.unwrap();
        assert_eq!(hw.kind(), HomeworkKind::Homework);
        assert_eq!(hw.days_remaining(now), 7);

        let err = f
            .store
            .create_homework(f.other_teacher, &draft(&f), now)
            .await
            .unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::PermissionDenied(_))));

        let listed = f.store.homework_for_stream(f.stream).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_total_rejected() {
        let f = fixture().await;
        let mut d = draft(&f);
        d.total_marks = -1.0;
        let err = f.store.create_homework(f.teacher, &d, due()).await.unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_late_hand_in_then_grade() {
        let f = fixture().await;
        let hw = f
            .store
            .create_homework(f.teacher, &draft(&f), due() - Duration::days(3))
            .await
            .unwrap();

        let on_time = f
            .store
            .submit_homework(hw.id, f.student, "Chlorophyll absorbs light.", due())
            .await
            .unwrap();
        assert_eq!(on_time.status(), SubmissionStatus::Submitted);

        let late = f
            .store
            .submit_homework(hw.id, f.student, "Revised answer.", due() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(late.id, on_time.id);
        assert_eq!(late.status(), SubmissionStatus::Late);

        let err = f
            .store
            .grade_submission(late.id, f.other_teacher, 10.0, None, due())
            .await
            .unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::PermissionDenied(_))));

        let err = f
            .store
            .grade_submission(late.id, f.teacher, 21.0, None, due())
            .await
            .unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::Invalid(_))));

        let graded = f
            .store
            .grade_submission(late.id, f.teacher, 16.0, Some("Good"), due())
            .await
            .unwrap();
        assert_eq!(graded.status(), SubmissionStatus::Graded);
        assert_eq!(graded.letter_grade(hw.total_marks), Some(LetterGrade::A));

        let err = f
            .store
            .submit_homework(hw.id, f.student, "One more try", due())
            .await
            .unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_deactivated_homework_is_hidden() {
        let f = fixture().await;
        let hw = f.store.create_homework(f.teacher, &draft(&f), due()).await.unwrap();

        let err = f
            .store
            .deactivate_homework(hw.id, f.other_teacher)
            .await
            .unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::PermissionDenied(_))));

        f.store.deactivate_homework(hw.id, f.teacher).await.unwrap();
        assert!(f.store.homework_for_stream(f.stream).await.unwrap().is_empty());
        assert_eq!(f.store.homework_by_staff(f.teacher).await.unwrap().len(), 1);
    }
}
