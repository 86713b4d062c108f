use async_trait::async_trait;
use tracing::debug;

use super::{CredentialStore, Variant};
use crate::auth::PasswordHasher;
use crate::db::{Database, UserRecord};
use crate::error::AppError;

const INSERT_USER: &str = r#"INSERT INTO "user" (username, password) VALUES ($1, $2)"#;
const SELECT_USER: &str = r#"SELECT username, password FROM "user" WHERE username = $1"#;

/// Gateway that binds every user-supplied value and verifies the stored hash.
pub struct ParameterizedCredentialStore {
    db: Database,
    hasher: PasswordHasher,
}

impl ParameterizedCredentialStore {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }
}

#[async_trait]
impl CredentialStore for ParameterizedCredentialStore {
    fn variant(&self) -> Variant {
        Variant::Parameterized
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<(), AppError> {
        let password_hash = self.hasher.hash_blocking(password).await?;

        sqlx::query(INSERT_USER)
            .bind(username)
            .bind(password_hash)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<String>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(SELECT_USER)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        let Some(user) = user else {
            debug!("No user row for login attempt");
            return Ok(None);
        };

        if self.hasher.verify_blocking(password, &user.password).await? {
            Ok(Some(user.username))
        } else {
            debug!("Password mismatch for {}", user.username);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::cheap_hasher;
    use crate::db::operations::memory_database;

    async fn store() -> (ParameterizedCredentialStore, Database) {
        let db = memory_database().await;
        (ParameterizedCredentialStore::new(db.clone(), cheap_hasher()), db)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (store, _db) = store().await;
        store.create_user("alice", "secret1").await.unwrap();

        assert_eq!(store.authenticate("alice", "secret1").await.unwrap().as_deref(), Some("alice"));
        assert_eq!(store.authenticate("alice", "wrongpass").await.unwrap(), None);
        assert_eq!(store.authenticate("nobody", "secret1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_always_true_predicate_is_just_a_name() {
        let (store, _db) = store().await;
        store.create_user("alice", "secret1").await.unwrap();

        assert_eq!(store.authenticate("' OR '1'='1", "secret1").await.unwrap(), None);
        assert_eq!(store.authenticate("alice' --", "anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_metacharacters_are_stored_literally() {
        let (store, db) = store().await;
        let hostile = r#"robert'); DELETE FROM "user"; --"#;

        store.create_user("alice", "secret1").await.unwrap();
        store.create_user(hostile, "pw").await.unwrap();

        let names: Vec<String> = sqlx::query_scalar(r#"SELECT username FROM "user" ORDER BY username"#)
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(names, vec!["alice".to_string(), hostile.to_string()]);

        assert_eq!(store.authenticate(hostile, "pw").await.unwrap().as_deref(), Some(hostile));
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_rejected() {
        let (store, _db) = store().await;
        store.create_user("alice", "secret1").await.unwrap();

        let result = store.create_user("alice", "other").await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert_eq!(store.authenticate("alice", "secret1").await.unwrap().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_plaintext_row_never_authenticates() {
        let (store, db) = store().await;
        sqlx::query(INSERT_USER)
            .bind("legacy")
            .bind("secret1")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(store.authenticate("legacy", "secret1").await.unwrap(), None);
    }
}
