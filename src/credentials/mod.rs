//! Credential Store Gateway
//!
//! Everything that touches the `"user"` table goes through
//! [`CredentialStore`]. The two implementations differ only in how
//! user-supplied values reach the SQL text and in whether the password is
//! actually checked:
//!
//! * [`VulnerableCredentialStore`] splices raw input into the statement and
//!   accepts any returned row as a login. It exists to be attacked.
//! * [`ParameterizedCredentialStore`] binds every value and verifies the
//!   Argon2 hash.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::db::Database;
use crate::error::AppError;

mod parameterized;
mod vulnerable;

pub use parameterized::ParameterizedCredentialStore;
pub use vulnerable::VulnerableCredentialStore;

/// Which security profile the server runs with. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// String-built SQL, presence-only login, unescaped member page,
    /// session rewritten on every request.
    Vulnerable,
    /// Bound parameters, hash verification, escaped output, sessions
    /// persisted only when modified.
    Parameterized,
}

impl Variant {
    /// Re-save the session on every request, modified or not.
    pub fn resaves_sessions(&self) -> bool {
        matches!(self, Variant::Vulnerable)
    }

    /// Escape the username on the members page.
    pub fn escapes_member_markup(&self) -> bool {
        matches!(self, Variant::Parameterized)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Vulnerable => write!(f, "vulnerable"),
            Variant::Parameterized => write!(f, "parameterized"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    fn variant(&self) -> Variant;

    /// Hash `password` and insert a new user row.
    async fn create_user(&self, username: &str, password: &str) -> Result<(), AppError>;

    /// Look the user up and decide whether the login succeeds.
    ///
    /// Returns the username recorded in the matching row, or `None` when
    /// the login is refused. Unknown users and wrong passwords are not
    /// distinguished.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<String>, AppError>;
}

/// Build the gateway for `variant` over a shared pool.
pub fn credential_store(
    variant: Variant,
    db: Database,
    hasher: PasswordHasher,
) -> Arc<dyn CredentialStore> {
    match variant {
        Variant::Vulnerable => Arc::new(VulnerableCredentialStore::new(db, hasher)),
        Variant::Parameterized => Arc::new(ParameterizedCredentialStore::new(db, hasher)),
    }
}
