use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{info, warn};

use super::{CredentialStore, Variant};
use crate::auth::PasswordHasher;
use crate::db::{Database, UserRecord};
use crate::error::AppError;

/// SQL-injectable gateway.
///
/// Statements are assembled with `format!` and sent as raw SQL, which the
/// driver may split into several statements. A login succeeds whenever the
/// lookup returns a row; the password is never compared.
pub struct VulnerableCredentialStore {
    db: Database,
    hasher: PasswordHasher,
}

impl VulnerableCredentialStore {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    fn insert_statement(username: &str, password_hash: &str) -> String {
        format!(
            r#"INSERT INTO "user" (username, password) VALUES ('{}', '{}')"#,
            username, password_hash
        )
    }

    fn select_statement(username: &str) -> String {
        format!(r#"SELECT * FROM "user" WHERE username = '{}'"#, username)
    }
}

#[async_trait]
impl CredentialStore for VulnerableCredentialStore {
    fn variant(&self) -> Variant {
        Variant::Vulnerable
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<(), AppError> {
        let password_hash = self.hasher.hash_blocking(password).await?;
        let query = Self::insert_statement(username, &password_hash);

        info!("Executing query: {}", query);
        sqlx::raw_sql(&query).execute(self.db.pool()).await?;
        Ok(())
    }

    async fn authenticate(&self, username: &str, _password: &str) -> Result<Option<String>, AppError> {
        let query = Self::select_statement(username);

        info!("Executing query: {}", query);
        let rows = sqlx::raw_sql(&query).fetch_all(self.db.pool()).await?;

        // Any row at all is taken as proof of identity.
        match rows.first() {
            Some(row) => {
                let user = UserRecord::from_row(row)?;
                if rows.len() > 1 {
                    warn!("Lookup for {:?} matched {} rows, logging in as {}", username, rows.len(), user.username);
                }
                Ok(Some(user.username))
            }
            None => Ok(None),
        }
    }
}
