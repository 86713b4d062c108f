use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::models::SessionRow;
use crate::db::{Database, SessionRecord};
use crate::error::SessionError;

/// External keyed store of session documents.
///
/// Expiry is owned by the store: `load` never returns a record whose
/// `expires_at` has passed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Insert or overwrite the record with the same id.
    async fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;

    async fn destroy(&self, id: &str) -> Result<(), SessionError>;

    /// Delete every expired record, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<u64, SessionError>;
}

/// Sessions kept in the `sessions` table of the relational store.
pub struct SqlSessionStore {
    db: Database,
}

impl SqlSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, authenticated, username, expires_at FROM sessions WHERE id = $1 AND expires_at > $2",
        )
        .bind(id)
        .bind(Utc::now().timestamp())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(SessionRecord::from))
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let row = SessionRow::from(record);
        sqlx::query(
            r#"
            INSERT INTO sessions (id, authenticated, username, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                authenticated = excluded.authenticated,
                username = excluded.username,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(row.id)
        .bind(row.authenticated)
        .bind(row.username)
        .bind(row.expires_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(Utc::now().timestamp())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

/// Process-local store. Sessions are lost on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).filter(|record| !record.is_expired()).cloned())
    }

    async fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
