pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod pages;
pub mod routes;
pub mod session;

use std::sync::Arc;
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, CredentialsForm, PasswordHasher};
pub use credentials::{credential_store, CredentialStore, Variant};
pub use db::Database;
pub use session::{Session, SessionManager, SessionPolicy, SessionStore};

/// Application state shared across all workers.
///
/// Every collaborator is built once at startup and handed in; handlers
/// never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub variant: Variant,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionManager>,
    database: Option<Database>,
}

impl AppState {
    /// Connect to the database, apply migrations and wire up the gateway
    /// and the session store for the configured variant.
    pub async fn new(config: Settings) -> Result<Self> {
        let database = Database::connect(&config.database).await?;
        database.migrate().await?;

        let hasher = PasswordHasher::new(&config.password)?;
        let credentials = credential_store(config.security.variant, database.clone(), hasher);
        let session_store = Arc::new(session::SqlSessionStore::new(database.clone()));

        let mut state = Self::from_parts(config, credentials, session_store);
        state.database = Some(database);
        Ok(state)
    }

    /// Assemble state from already-built collaborators.
    ///
    /// The variant is taken from the credential store so the session policy
    /// and page escaping always match the gateway in use.
    pub fn from_parts(
        config: Settings,
        credentials: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let variant = credentials.variant();
        let policy = SessionPolicy::for_variant(variant, config.session.max_age_secs);
        let sessions = SessionManager::new(
            session_store,
            policy,
            &config.session.secret,
            config.session.cookie_name.clone(),
        );

        info!("Application state ready (variant: {})", variant);

        Self {
            config: Arc::new(config),
            variant,
            auth: Arc::new(AuthService::new(credentials)),
            sessions: Arc::new(sessions),
            database: None,
        }
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(database) = &self.database {
            database.close().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::cheap_hasher;
    use crate::db::operations::memory_database;
    use crate::session::MemorySessionStore;

    #[tokio::test]
    async fn test_app_state_creation_with_memory_database() {
        let mut config = Settings::defaults().expect("Failed to load test config");
        config.database.url = "sqlite::memory:".to_string();
        config.security.variant = Variant::Vulnerable;

        let state = AppState::new(config).await.expect("state");
        assert_eq!(state.variant, Variant::Vulnerable);
        assert!(state.sessions.policy().resave);
        assert!(state.database().is_some());
        state.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_app_state_bad_database_url() {
        let mut config = Settings::defaults().expect("Failed to load test config");
        config.database.url = "sqlite:///definitely/not/here/gatekeep.db".to_string();
        config.database.acquire_timeout_secs = 1;

        let state = AppState::new(config).await;
        assert!(matches!(state, Err(AppError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_collaborators() {
        let config = Settings::defaults().expect("Failed to load test config");
        let db = memory_database().await;
        let credentials = credential_store(Variant::Parameterized, db, cheap_hasher());

        let state = AppState::from_parts(config, credentials, Arc::new(MemorySessionStore::new()));
        let cloned = state.clone();

        assert_eq!(state.variant, Variant::Parameterized);
        assert!(!state.sessions.policy().resave);
        assert!(state.database().is_none());
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.sessions, &cloned.sessions));
        assert!(Arc::ptr_eq(&state.auth, &cloned.auth));
    }
}
