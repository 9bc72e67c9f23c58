//! Login credentials.

use crate::error::{StoreError, is_unique_violation};
use crate::models::{Identity, NewIdentity};
use crate::Store;

const IDENTITY_COLUMNS: &str = "id, username, email, password_hash, is_admin";

impl Store {
    /// Exact-match lookup; callers pass an already lower-cased email.
    pub async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?");
        let row = sqlx::query_as::<_, Identity>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn identity_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?");
        let row = sqlx::query_as::<_, Identity>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM identities WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool())
            .await?;
        Ok(n > 0)
    }

    pub async fn count_identities(&self) -> Result<i64, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM identities")
            .fetch_one(self.pool())
            .await?;
        Ok(n)
    }

    /// Create-or-fetch an identity keyed by email.
    ///
    /// If another request already created an identity for the same email the
    /// existing row is returned. A username collision is reported as
    /// [`StoreError::Conflict`] so the caller can pick another handle.
    pub async fn create_identity(&self, new: &NewIdentity) -> Result<Identity, StoreError> {
        let sql = format!(
            "INSERT INTO identities (username, email, password_hash, is_admin) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {IDENTITY_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Identity>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.is_admin)
            .fetch_optional(self.pool())
            .await;

        match inserted {
            Ok(Some(identity)) => {
                tracing::info!(
                    identity_id = identity.id,
                    username = %identity.username,
                    "identity created"
                );
                Ok(identity)
            }
            Ok(None) => {
                tracing::info!(email = %new.email, "identity already exists for email; reusing it");
                self.identity_by_email(&new.email).await?.ok_or_else(|| {
                    StoreError::Internal(anyhow::anyhow!(
                        "identity for {} vanished after conflict",
                        new.email
                    ))
                })
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "username {} is taken",
                new.username
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_identity(username: &str, email: &str) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_existing_row() {
        let store = Store::in_memory().await.unwrap();
        let first = store
            .create_identity(&new_identity("alice", "alice@x.com"))
            .await
            .unwrap();
        let second = store
            .create_identity(&new_identity("alice1", "alice@x.com"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "alice");
        assert_eq!(store.count_identities().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_username_collision_is_conflict() {
        let store = Store::in_memory().await.unwrap();
        store
            .create_identity(&new_identity("alice", "alice@x.com"))
            .await
            .unwrap();
        let err = store
            .create_identity(&new_identity("alice", "alice@y.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.username_taken("alice").await.unwrap());
        assert!(!store.username_taken("bob").await.unwrap());
    }
}
