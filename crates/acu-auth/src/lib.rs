//! # acu-auth
//!
//! Everything between a visitor typing an email and an authenticated session:
//!
//! - [`directory`]: ordered lookup of an email across identities, staff and
//!   students, plus handle allocation for new identities
//! - [`flow`]: the multi-step login state machine
//! - [`password`]: Argon2 hashing and new-password validation
//! - [`session`]: per-visitor session data and its storage

pub mod directory;
pub mod error;
pub mod flow;
pub mod password;
pub mod session;

pub use directory::{CredentialDirectory, Resolution};
pub use error::AuthError;
pub use flow::{LoginFlow, LoginState, LoginSubmission, Step};
pub use session::{AuthenticatedIdentity, Flash, FlashLevel, MemorySessionStore, SESSION_TTL, Session, SessionId, SessionStore};
