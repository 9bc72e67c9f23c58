//! # acu-core
//!
//! Types shared by every AcuVerify crate:
//! - the user-facing error taxonomy ([`SchoolError`])
//! - role and homework enums persisted as text
//! - grading rules for homework submissions

pub mod email;
pub mod error;
pub mod grading;
pub mod model;

pub use error::SchoolError;
pub use grading::{LetterGrade, percentage};
pub use model::{Gender, HomeworkKind, Role, SubmissionStatus};

/// Minimum length of a password chosen at first login.
pub const MIN_PASSWORD_LEN: usize = 8;
