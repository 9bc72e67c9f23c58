//! Error taxonomy surfaced to users at the request boundary.

use thiserror::Error;

/// Recoverable failures of school operations.
///
/// Every variant is rendered as a user-visible message; none of them is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchoolError {
    /// No identity, staff or student record carries the submitted email.
    #[error("A user with this email does not exist.")]
    UnknownEmail,

    /// The password did not match the stored credential.
    #[error("Invalid password.")]
    InvalidCredentials,

    /// Password and confirmation differ.
    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// Password shorter than the configured minimum.
    #[error("Password must be at least {min} characters long.")]
    PasswordTooShort { min: usize },

    /// No academic period exists to scope an assignment.
    #[error("No academic period has been set up.")]
    NoAcademicPeriod,

    /// The acting user may not perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Form input failed validation.
    #[error("{0}")]
    Invalid(String),
}

impl SchoolError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::Invalid(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            SchoolError::UnknownEmail.to_string(),
            "A user with this email does not exist."
        );
        assert_eq!(
            SchoolError::PasswordTooShort { min: 8 }.to_string(),
            "Password must be at least 8 characters long."
        );
        assert_eq!(
            SchoolError::not_found("stream 4").to_string(),
            "not found: stream 4"
        );
    }
}
