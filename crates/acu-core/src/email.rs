//! Email address checks shared by login and registration forms.

use crate::error::SchoolError;

/// Loose structural check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Trim, validate and lower-case an email typed into a form.
pub fn normalize(raw: &str) -> Result<String, SchoolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SchoolError::invalid("Email address is required."));
    }
    if !is_valid(trimmed) {
        return Err(SchoolError::invalid("Enter a valid email address."));
    }
    Ok(trimmed.to_lowercase())
}

/// The part before `@`, used as the base of a login handle.
pub fn local_part(email: &str) -> &str {
    email.split_once('@').map(|(l, _)| l).unwrap_or(email)
}
