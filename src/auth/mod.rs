//! Authentication module for the gatekeep server
//!
//! Form validation, password hashing and the signup/login/logout handlers.
//! Storage of credentials is delegated to [`crate::credentials`].

pub mod handlers;
pub mod password;
mod service;

pub use password::PasswordHasher;
pub use service::{AuthService, CredentialsForm};
