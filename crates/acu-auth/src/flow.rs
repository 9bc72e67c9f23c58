//! The multi-step login state machine.
//!
//! ```text
//! EmailEntry --known identity--> PasswordEntry --correct password--> Authenticated
//!     |
//!     +--staff/student without login--> CreatePassword --valid password--> Authenticated
//! ```
//!
//! The state lives in the visitor's session and is passed in by `&mut`.
//! Failed submissions leave the state where it was, except a vanished
//! identity which sends the visitor back to email entry.

use acu_core::{Role, SchoolError, email};
use serde::{Deserialize, Serialize};

use crate::directory::{self, CredentialDirectory, Resolution};
use crate::error::AuthError;
use crate::password;
use crate::session::AuthenticatedIdentity;

/// Where a visitor is in the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LoginState {
    #[default]
    EmailEntry,
    /// The email already has credentials.
    PasswordEntry { email: String },
    /// The email belongs to a staff or student record without credentials.
    CreatePassword {
        email: String,
        role: Role,
        person_id: i64,
    },
}

impl LoginState {
    pub fn email(&self) -> Option<&str> {
        match self {
            LoginState::EmailEntry => None,
            LoginState::PasswordEntry { email } | LoginState::CreatePassword { email, .. } => {
                Some(email)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoginState::EmailEntry => "email",
            LoginState::PasswordEntry { .. } => "password",
            LoginState::CreatePassword { .. } => "create_password",
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved to (or stayed at) a step that needs more input.
    Continue,
    /// Credentials accepted; the caller establishes the session.
    Authenticated(AuthenticatedIdentity),
    /// First login: credentials were just created for a staff or student
    /// record. The caller establishes the session.
    Registered {
        identity: AuthenticatedIdentity,
        role: Role,
    },
}

impl Step {
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            Step::Continue => None,
            Step::Authenticated(identity) | Step::Registered { identity, .. } => Some(identity),
        }
    }
}

/// Everything the login form can carry; each step reads the fields it needs.
#[derive(Debug, Clone, Default)]
pub struct LoginSubmission {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Drives [`LoginState`] transitions against a credential directory.
pub struct LoginFlow<'a, D: ?Sized> {
    directory: &'a D,
}

impl<'a, D> LoginFlow<'a, D>
where
    D: CredentialDirectory + ?Sized,
{
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Return to email entry, forgetting everything the flow stored.
    pub fn reset(state: &mut LoginState) {
        *state = LoginState::EmailEntry;
    }

    /// Dispatch a form submission to the handler for the current step.
    pub async fn submit(
        &self,
        state: &mut LoginState,
        form: &LoginSubmission,
    ) -> Result<Step, AuthError> {
        match state {
            LoginState::EmailEntry => self.submit_email(state, &form.email).await,
            LoginState::PasswordEntry { .. } => self.submit_password(state, &form.password).await,
            LoginState::CreatePassword { .. } => {
                self.submit_new_password(state, &form.password, &form.confirm_password)
                    .await
            }
        }
    }

    /// Handle the email form.
    pub async fn submit_email(
        &self,
        state: &mut LoginState,
        raw_email: &str,
    ) -> Result<Step, AuthError> {
        let email = email::normalize(raw_email)?;

        let next = match directory::resolve(self.directory, &email).await? {
            Resolution::Found(_) => LoginState::PasswordEntry { email },
            Resolution::FoundUnregistered(role, person_id) => LoginState::CreatePassword {
                email,
                role,
                person_id,
            },
            Resolution::NotFound => {
                tracing::info!(email = %email, "login attempted for unknown email");
                Self::reset(state);
                return Err(SchoolError::UnknownEmail.into());
            }
        };

        tracing::debug!(email = ?next.email(), step = next.name(), "login email accepted");
        *state = next;
        Ok(Step::Continue)
    }

    /// Handle the password form of a visitor who already has credentials.
    pub async fn submit_password(
        &self,
        state: &mut LoginState,
        password: &str,
    ) -> Result<Step, AuthError> {
        let email = match state {
            LoginState::PasswordEntry { email } => email.clone(),
            _ => {
                tracing::warn!(step = state.name(), "password submitted out of order; resetting");
                Self::reset(state);
                return Ok(Step::Continue);
            }
        };

        let Some(identity) = self.directory.identity_by_email(&email).await? else {
            tracing::warn!(email = %email, "identity vanished during login");
            Self::reset(state);
            return Err(SchoolError::UnknownEmail.into());
        };

        if !password::verify_password(password, &identity.password_hash)? {
            tracing::info!(identity_id = identity.id, "wrong password");
            return Err(SchoolError::InvalidCredentials.into());
        }

        tracing::info!(identity_id = identity.id, username = %identity.username, "login succeeded");
        Self::reset(state);
        Ok(Step::Authenticated(AuthenticatedIdentity::from(&identity)))
    }

    /// Handle the first-login form: choose a password and create credentials.
    pub async fn submit_new_password(
        &self,
        state: &mut LoginState,
        password: &str,
        confirm: &str,
    ) -> Result<Step, AuthError> {
        let (email, role, person_id) = match state {
            LoginState::CreatePassword {
                email,
                role,
                person_id,
            } => (email.clone(), *role, *person_id),
            _ => {
                tracing::warn!(step = state.name(), "new password submitted out of order; resetting");
                Self::reset(state);
                return Ok(Step::Continue);
            }
        };

        password::validate_new_password(password, confirm)?;

        let hash = password::hash_password(password)?;
        let identity = directory::register_identity(self.directory, &email, hash.clone()).await?;

        // Someone else registered this email first; their password stands.
        if identity.password_hash != hash
            && !password::verify_password(password, &identity.password_hash)?
        {
            tracing::info!(identity_id = identity.id, "email registered concurrently");
            *state = LoginState::PasswordEntry { email };
            return Err(SchoolError::InvalidCredentials.into());
        }

        tracing::info!(
            identity_id = identity.id,
            username = %identity.username,
            role = %role,
            person_id,
            "first login, credentials created"
        );
        Self::reset(state);
        Ok(Step::Registered {
            identity: AuthenticatedIdentity::from(&identity),
            role,
        })
    }
}
