//! Database module for the gatekeep server
//!
//! Connection pooling, embedded migrations and the row types shared by
//! the credential stores and the SQL session store.

pub mod models;
pub mod operations;

pub use models::{SessionRecord, UserRecord};
pub use operations::{Database, DbPoolStatus};
