//! Error types for the login flow.

use acu_core::SchoolError;
use acu_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A rule of the login flow rejected the submission.
    #[error(transparent)]
    School(SchoolError),

    /// The backing store failed.
    #[error(transparent)]
    Store(StoreError),

    /// Hashing or parsing a password hash failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl AuthError {
    /// The user-facing error inside, if any.
    pub fn as_school(&self) -> Option<&SchoolError> {
        match self {
            AuthError::School(e) => Some(e),
            AuthError::Store(e) => e.as_school(),
            AuthError::Hash(_) => None,
        }
    }
}

impl From<SchoolError> for AuthError {
    fn from(e: SchoolError) -> Self {
        AuthError::School(e)
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::School(s) => AuthError::School(s),
            other => AuthError::Store(other),
        }
    }
}
