//! Error types for the store crate.

use acu_core::SchoolError;
use thiserror::Error;

/// Errors that can occur while reading or writing school data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    School(#[from] SchoolError),

    /// A unique key is already taken by another row.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    /// The user-facing error inside, if any.
    pub fn as_school(&self) -> Option<&SchoolError> {
        match self {
            StoreError::School(e) => Some(e),
            _ => None,
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
