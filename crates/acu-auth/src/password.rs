//! Argon2 password hashing.

use acu_core::{MIN_PASSWORD_LEN, SchoolError};
use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::error::AuthError;

/// Hash `password` into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Check `password` against a stored PHC string.
///
/// A malformed stored hash is an error, not a mismatch.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Validate a password chosen at first login.
///
/// Length is checked before the confirmation.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), SchoolError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SchoolError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if password != confirm {
        return Err(SchoolError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AuthError::Hash(_))
        ));
    }

    #[test]
    fn test_short_password_reported_before_mismatch() {
        assert_eq!(
            validate_new_password("short", "other"),
            Err(SchoolError::PasswordTooShort { min: 8 })
        );
        assert_eq!(
            validate_new_password("longenough", "longenougH"),
            Err(SchoolError::PasswordMismatch)
        );
        assert_eq!(validate_new_password("longenough", "longenough"), Ok(()));
    }
}
