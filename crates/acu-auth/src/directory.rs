//! Who does an email belong to?
//!
//! Resolution order is fixed: an existing login identity first, then a staff
//! record, then a student record.

use acu_core::{Role, email};
use acu_store::{Identity, NewIdentity, Store, StoreError};
use async_trait::async_trait;

/// Upper bound on handle suffixes tried before giving up.
const MAX_HANDLE_ATTEMPTS: u32 = 1000;

/// Read/write access to login identities and the people they belong to.
#[async_trait]
pub trait CredentialDirectory: Send + Sync {
    /// Exact match on the stored (lower-cased) email.
    async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Case-insensitive match.
    async fn staff_id_by_email(&self, email: &str) -> Result<Option<i64>, StoreError>;

    /// Case-insensitive match.
    async fn student_id_by_email(&self, email: &str) -> Result<Option<i64>, StoreError>;

    async fn username_taken(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert an identity; if one already exists for the email, return it.
    async fn create_identity(&self, new: &NewIdentity) -> Result<Identity, StoreError>;
}

#[async_trait]
impl CredentialDirectory for Store {
    async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Store::identity_by_email(self, email).await
    }

    async fn staff_id_by_email(&self, email: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.staff_by_email(email).await?.map(|s| s.id))
    }

    async fn student_id_by_email(&self, email: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.student_by_email(email).await?.map(|s| s.id))
    }

    async fn username_taken(&self, username: &str) -> Result<bool, StoreError> {
        Store::username_taken(self, username).await
    }

    async fn create_identity(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        Store::create_identity(self, new).await
    }
}

/// Outcome of looking an email up.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The email already has login credentials.
    Found(Identity),
    /// A person record exists but has never logged in.
    FoundUnregistered(Role, i64),
    NotFound,
}

/// Resolve a normalized email.
pub async fn resolve<D>(directory: &D, email: &str) -> Result<Resolution, StoreError>
where
    D: CredentialDirectory + ?Sized,
{
    if let Some(identity) = directory.identity_by_email(email).await? {
        return Ok(Resolution::Found(identity));
    }
    if let Some(id) = directory.staff_id_by_email(email).await? {
        return Ok(Resolution::FoundUnregistered(Role::Staff, id));
    }
    if let Some(id) = directory.student_id_by_email(email).await? {
        return Ok(Resolution::FoundUnregistered(Role::Student, id));
    }
    Ok(Resolution::NotFound)
}

/// Handle candidates for an email: `alice`, `alice1`, `alice2`, ...
fn handle_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}{attempt}")
    }
}

/// Create an identity for `email` under the first free handle derived from
/// its local part.
///
/// A handle taken between the check and the insert is retried with the next
/// suffix. If another request created an identity for the same email first,
/// that identity is returned.
pub async fn register_identity<D>(
    directory: &D,
    email: &str,
    password_hash: String,
) -> Result<Identity, StoreError>
where
    D: CredentialDirectory + ?Sized,
{
    let base = email::local_part(email);

    for attempt in 0..MAX_HANDLE_ATTEMPTS {
        let username = handle_candidate(base, attempt);
        if directory.username_taken(&username).await? {
            continue;
        }

        let new = NewIdentity {
            username,
            email: email.to_string(),
            password_hash: password_hash.clone(),
            is_admin: false,
        };
        match directory.create_identity(&new).await {
            Ok(identity) => return Ok(identity),
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!(username = %new.username, %reason, "handle raced, trying next");
            }
            Err(e) => return Err(e),
        }
    }

    Err(StoreError::Conflict(format!(
        "no free handle for {base} after {MAX_HANDLE_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use acu_core::Gender;
    use acu_store::{StaffDraft, StudentDraft};

    fn identity(username: &str, email: &str) -> NewIdentity {
        NewIdentity {
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_identity_wins_over_person_records() {
        let store = Store::in_memory().await.unwrap();
        store
            .register_staff(&StaffDraft {
                first_name: "Alice".into(),
                last_name: "Mwangi".into(),
                email: "Alice@School.ac.ke".into(),
                gender: Gender::Female,
                position: "Teacher".into(),
                department: "Languages".into(),
                address: "Kisumu".into(),
                phone: None,
                specializations: vec![],
            })
            .await
            .unwrap();

        let resolved = resolve(&store, "alice@school.ac.ke").await.unwrap();
        assert!(matches!(resolved, Resolution::FoundUnregistered(Role::Staff, _)));

        store
            .create_identity(&identity("alice", "alice@school.ac.ke"))
            .await
            .unwrap();
        let resolved = resolve(&store, "alice@school.ac.ke").await.unwrap();
        assert!(matches!(resolved, Resolution::Found(i) if i.username == "alice"));
    }

    #[tokio::test]
    async fn test_student_resolution_and_not_found() {
        let store = Store::in_memory().await.unwrap();
        let class = store.ensure_class("Grade 9").await.unwrap();
        let stream = store.ensure_stream(class.id, "West").await.unwrap();
        let student = store
            .register_student(&StudentDraft {
                admission_number: "ADM-900".into(),
                first_name: "Baraka".into(),
                last_name: "Otieno".into(),
                email: Some("baraka@school.ac.ke".into()),
                gender: Gender::Male,
                class_id: class.id,
                stream_id: stream.id,
                address: "Kisii".into(),
                phone: None,
            })
            .await
            .unwrap();

        let resolved = resolve(&store, "baraka@school.ac.ke").await.unwrap();
        assert!(
            matches!(resolved, Resolution::FoundUnregistered(Role::Student, id) if id == student.id)
        );
        assert!(matches!(
            resolve(&store, "nobody@school.ac.ke").await.unwrap(),
            Resolution::NotFound
        ));
    }

    #[tokio::test]
    async fn test_handle_gets_numeric_suffix() {
        let store = Store::in_memory().await.unwrap();
        store
            .create_identity(&identity("alice", "alice@other.org"))
            .await
            .unwrap();

        let created = register_identity(&store, "alice@x.com", "$argon2id$stub".into())
            .await
            .unwrap();
        assert_eq!(created.username, "alice1");

        let created = register_identity(&store, "alice@y.com", "$argon2id$stub".into())
            .await
            .unwrap();
        assert_eq!(created.username, "alice2");
    }

    #[tokio::test]
    async fn test_existing_email_returns_existing_identity() {
        let store = Store::in_memory().await.unwrap();
        let first = register_identity(&store, "alice@x.com", "first".into())
            .await
            .unwrap();
        let again = register_identity(&store, "alice@x.com", "second".into())
            .await
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.password_hash, "first");
    }
}
