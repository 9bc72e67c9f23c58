//! Staff and student records.

use acu_core::{SchoolError, email};

use crate::error::{StoreError, is_unique_violation};
use crate::models::{Staff, StaffDraft, Student, StudentDraft, Subject};
use crate::Store;

const STAFF_COLUMNS: &str =
    "id, first_name, last_name, email, gender, position, department, address, phone";
const STUDENT_COLUMNS: &str = "id, admission_number, first_name, last_name, email, gender, \
     class_id, stream_id, address, phone";

fn required(field: &str, value: &str) -> Result<(), SchoolError> {
    if value.trim().is_empty() {
        return Err(SchoolError::invalid(format!("{field} is required.")));
    }
    Ok(())
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Emails are stored and compared in one folded form so lookups do not
/// depend on SQLite's ASCII-only `lower()`.
fn fold_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_staff(draft: &StaffDraft) -> Result<(), SchoolError> {
    required("First name", &draft.first_name)?;
    required("Last name", &draft.last_name)?;
    required("Position", &draft.position)?;
    required("Department", &draft.department)?;
    required("Address", &draft.address)?;
    if !email::is_valid(draft.email.trim()) {
        return Err(SchoolError::invalid("Enter a valid email address."));
    }
    Ok(())
}

fn validate_student(draft: &StudentDraft) -> Result<(), SchoolError> {
    required("Admission number", &draft.admission_number)?;
    required("First name", &draft.first_name)?;
    required("Last name", &draft.last_name)?;
    required("Address", &draft.address)?;
    if let Some(e) = optional(&draft.email) {
        if !email::is_valid(&e) {
            return Err(SchoolError::invalid("Enter a valid email address."));
        }
    }
    Ok(())
}

impl Store {
    // ---------------------------------------------------------------------
    // Staff
    // ---------------------------------------------------------------------

    /// Case-insensitive lookup; the oldest record wins if several match.
    pub async fn staff_by_email(&self, email: &str) -> Result<Option<Staff>, StoreError> {
        let sql = format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE email = ? ORDER BY id LIMIT 1"
        );
        let row = sqlx::query_as::<_, Staff>(&sql)
            .bind(fold_email(email))
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn staff_by_id(&self, id: i64) -> Result<Option<Staff>, StoreError> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?");
        let row = sqlx::query_as::<_, Staff>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// All staff ordered by first then last name.
    pub async fn list_staff(&self) -> Result<Vec<Staff>, StoreError> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY first_name, last_name, id");
        let rows = sqlx::query_as::<_, Staff>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Subjects the staff member is qualified to teach, by name.
    pub async fn specializations(&self, staff_id: i64) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query_as::<_, Subject>(
            "SELECT s.id, s.class_id, s.name FROM subjects s \
             JOIN staff_specializations sp ON sp.subject_id = s.id \
             WHERE sp.staff_id = ? ORDER BY s.name, s.id",
        )
        .bind(staff_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn check_subjects_exist(&self, ids: &[i64]) -> Result<(), StoreError> {
        for id in ids {
            if self.subject_by_id(*id).await?.is_none() {
                return Err(SchoolError::not_found(format!("subject {id}")).into());
            }
        }
        Ok(())
    }

    pub async fn register_staff(&self, draft: &StaffDraft) -> Result<Staff, StoreError> {
        validate_staff(draft)?;
        self.check_subjects_exist(&draft.specializations).await?;

        let mut tx = self.pool().begin().await?;
        let sql = format!(
            "INSERT INTO staff (first_name, last_name, email, gender, position, department, address, phone) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {STAFF_COLUMNS}"
        );
        let staff = sqlx::query_as::<_, Staff>(&sql)
            .bind(draft.first_name.trim())
            .bind(draft.last_name.trim())
            .bind(fold_email(&draft.email))
            .bind(draft.gender.as_str())
            .bind(draft.position.trim())
            .bind(draft.department.trim())
            .bind(draft.address.trim())
            .bind(optional(&draft.phone))
            .fetch_one(&mut *tx)
            .await?;
        for subject_id in &draft.specializations {
            sqlx::query(
                "INSERT INTO staff_specializations (staff_id, subject_id) VALUES (?, ?) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(staff.id)
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            staff_id = staff.id,
            specializations = draft.specializations.len(),
            "staff registered"
        );
        Ok(staff)
    }

    /// Overwrite a staff record; the specialization set is replaced wholesale.
    pub async fn update_staff(&self, id: i64, draft: &StaffDraft) -> Result<Staff, StoreError> {
        validate_staff(draft)?;
        self.check_subjects_exist(&draft.specializations).await?;

        let mut tx = self.pool().begin().await?;
        let sql = format!(
            "UPDATE staff SET first_name = ?, last_name = ?, email = ?, gender = ?, position = ?, \
             department = ?, address = ?, phone = ? WHERE id = ? RETURNING {STAFF_COLUMNS}"
        );
        let staff = sqlx::query_as::<_, Staff>(&sql)
            .bind(draft.first_name.trim())
            .bind(draft.last_name.trim())
            .bind(fold_email(&draft.email))
            .bind(draft.gender.as_str())
            .bind(draft.position.trim())
            .bind(draft.department.trim())
            .bind(draft.address.trim())
            .bind(optional(&draft.phone))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| SchoolError::not_found(format!("staff {id}")))?;

        sqlx::query("DELETE FROM staff_specializations WHERE staff_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for subject_id in &draft.specializations {
            sqlx::query(
                "INSERT INTO staff_specializations (staff_id, subject_id) VALUES (?, ?) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(staff_id = id, "staff updated");
        Ok(staff)
    }

    pub async fn delete_staff(&self, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM staff WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(SchoolError::not_found(format!("staff {id}")).into());
        }
        tracing::info!(staff_id = id, "staff deleted");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Students
    // ---------------------------------------------------------------------

    /// Case-insensitive lookup; the oldest record wins if several match.
    pub async fn student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE email = ? ORDER BY id LIMIT 1"
        );
        let row = sqlx::query_as::<_, Student>(&sql)
            .bind(fold_email(email))
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn student_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?");
        let row = sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY first_name, last_name, id");
        let rows = sqlx::query_as::<_, Student>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn students_in_stream(&self, stream_id: i64) -> Result<Vec<Student>, StoreError> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE stream_id = ? ORDER BY first_name, last_name, id"
        );
        let rows = sqlx::query_as::<_, Student>(&sql)
            .bind(stream_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// The stream must exist and belong to the chosen class.
    async fn check_enrolment(&self, class_id: i64, stream_id: i64) -> Result<(), StoreError> {
        let stream = self
            .stream_by_id(stream_id)
            .await?
            .ok_or_else(|| SchoolError::not_found(format!("stream {stream_id}")))?;
        if stream.class_id != class_id {
            return Err(SchoolError::invalid(format!(
                "Stream {} does not belong to the selected class.",
                stream.label()
            ))
            .into());
        }
        Ok(())
    }

    fn admission_conflict(e: sqlx::Error, number: &str) -> StoreError {
        if is_unique_violation(&e) {
            SchoolError::invalid(format!("Admission number {number} is already in use.")).into()
        } else {
            e.into()
        }
    }

    pub async fn register_student(&self, draft: &StudentDraft) -> Result<Student, StoreError> {
        validate_student(draft)?;
        self.check_enrolment(draft.class_id, draft.stream_id).await?;

        let number = draft.admission_number.trim();
        let sql = format!(
            "INSERT INTO students (admission_number, first_name, last_name, email, gender, class_id, \
             stream_id, address, phone) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {STUDENT_COLUMNS}"
        );
        let student = sqlx::query_as::<_, Student>(&sql)
            .bind(number)
            .bind(draft.first_name.trim())
            .bind(draft.last_name.trim())
            .bind(optional(&draft.email).as_deref().map(fold_email))
            .bind(draft.gender.as_str())
            .bind(draft.class_id)
            .bind(draft.stream_id)
            .bind(draft.address.trim())
            .bind(optional(&draft.phone))
            .fetch_one(self.pool())
            .await
            .map_err(|e| Self::admission_conflict(e, number))?;

        tracing::info!(student_id = student.id, stream_id = student.stream_id, "student registered");
        Ok(student)
    }

    pub async fn update_student(&self, id: i64, draft: &StudentDraft) -> Result<Student, StoreError> {
        validate_student(draft)?;
        self.check_enrolment(draft.class_id, draft.stream_id).await?;

        let number = draft.admission_number.trim();
        let sql = format!(
            "UPDATE students SET admission_number = ?, first_name = ?, last_name = ?, email = ?, \
             gender = ?, class_id = ?, stream_id = ?, address = ?, phone = ? \
             WHERE id = ? RETURNING {STUDENT_COLUMNS}"
        );
        let student = sqlx::query_as::<_, Student>(&sql)
            .bind(number)
            .bind(draft.first_name.trim())
            .bind(draft.last_name.trim())
            .bind(optional(&draft.email).as_deref().map(fold_email))
            .bind(draft.gender.as_str())
            .bind(draft.class_id)
            .bind(draft.stream_id)
            .bind(draft.address.trim())
            .bind(optional(&draft.phone))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| Self::admission_conflict(e, number))?
            .ok_or_else(|| SchoolError::not_found(format!("student {id}")))?;

        tracing::info!(student_id = id, "student updated");
        Ok(student)
    }

    pub async fn delete_student(&self, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(SchoolError::not_found(format!("student {id}")).into());
        }
        tracing::info!(student_id = id, "student deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acu_core::Gender;

    fn staff_draft(email: &str, specializations: Vec<i64>) -> StaffDraft {
        StaffDraft {
            first_name: "Jane".into(),
            last_name: "Wanjiru".into(),
            email: email.into(),
            gender: Gender::Female,
            position: "Teacher".into(),
            department: "Science".into(),
            address: "Nyeri".into(),
            phone: Some("  ".into()),
            specializations,
        }
    }

    #[tokio::test]
    async fn test_staff_email_lookup_ignores_case() {
        let store = Store::in_memory().await.unwrap();
        let staff = store
            .register_staff(&staff_draft("Jane.W@School.ac.ke", vec![]))
            .await
            .unwrap();
        assert_eq!(staff.phone, None);

        let found = store.staff_by_email("jane.w@school.ac.ke").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(staff.id));
        assert!(store.staff_by_email("nobody@school.ac.ke").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_lookup_folds_non_ascii() {
        let store = Store::in_memory().await.unwrap();
        let staff = store
            .register_staff(&staff_draft("ÉLODIE.Ñúñez@School.ac.ke", vec![]))
            .await
            .unwrap();
        assert_eq!(staff.email, "élodie.ñúñez@school.ac.ke");

        for typed in ["élodie.ñúñez@school.ac.ke", "ÉLODIE.ÑÚÑEZ@SCHOOL.AC.KE"] {
            let found = store.staff_by_email(typed).await.unwrap();
            assert_eq!(found.map(|s| s.id), Some(staff.id), "{typed}");
        }

        let class = store.ensure_class("Form 1").await.unwrap();
        let east = store.ensure_stream(class.id, "East").await.unwrap();
        let student = store
            .register_student(&StudentDraft {
                admission_number: "ADM-900".into(),
                first_name: "Zoë".into(),
                last_name: "Öztürk".into(),
                email: Some(" ZOË@School.ac.ke ".into()),
                gender: Gender::Female,
                class_id: class.id,
                stream_id: east.id,
                address: "Mombasa".into(),
                phone: None,
            })
            .await
            .unwrap();
        let found = store.student_by_email("zoë@school.ac.ke").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(student.id));
    }

    #[tokio::test]
    async fn test_update_replaces_specializations() {
        let store = Store::in_memory().await.unwrap();
        let class = store.ensure_class("Form 1").await.unwrap();
        let math = store.ensure_subject(class.id, "Mathematics").await.unwrap();
        let bio = store.ensure_subject(class.id, "Biology").await.unwrap();

        let staff = store
            .register_staff(&staff_draft("t@school.ac.ke", vec![math.id]))
            .await
            .unwrap();
        store
            .update_staff(staff.id, &staff_draft("t@school.ac.ke", vec![bio.id]))
            .await
            .unwrap();

        let specs = store.specializations(staff.id).await.unwrap();
        assert_eq!(specs, vec![bio]);
    }

    #[tokio::test]
    async fn test_student_stream_must_match_class() {
        let store = Store::in_memory().await.unwrap();
        let form1 = store.ensure_class("Form 1").await.unwrap();
        let form2 = store.ensure_class("Form 2").await.unwrap();
        let east = store.ensure_stream(form2.id, "East").await.unwrap();

        let draft = StudentDraft {
            admission_number: "ADM-001".into(),
            first_name: "Otieno".into(),
            last_name: "Omondi".into(),
            email: Some("otieno@school.ac.ke".into()),
            gender: Gender::Male,
            class_id: form1.id,
            stream_id: east.id,
            address: "Kisumu".into(),
            phone: None,
        };
        let err = store.register_student(&draft).await.unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::Invalid(_))));

        let ok = StudentDraft { class_id: form2.id, ..draft.clone() };
        store.register_student(&ok).await.unwrap();
        let dup = store.register_student(&ok).await.unwrap_err();
        assert!(matches!(dup.as_school(), Some(SchoolError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_staff_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let err = store.delete_staff(42).await.unwrap_err();
        assert!(matches!(err.as_school(), Some(SchoolError::NotFound(_))));
    }
}
