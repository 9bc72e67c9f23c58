//! AcuVerify web server.
//!
//! Server-rendered HTML over axum: the email-first login flow, the staff and
//! student directory, teaching assignments, academic setup and homework.

pub mod access;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod state;
pub mod templates;
pub mod visitor;

pub use config::{AppConfig, load_config};
pub use error::WebError;
pub use routes::create_router;
pub use state::AppState;
