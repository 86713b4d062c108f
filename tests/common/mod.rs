#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::LOCATION;
use gatekeep_server::config::{DatabaseConfig, PasswordConfig};
use gatekeep_server::session::SqlSessionStore;
use gatekeep_server::{
    credential_store, AppState, Database, PasswordHasher, SessionStore, Settings, Variant,
};
use std::sync::Arc;

pub const COOKIE: &str = "sid";

/// Build the full application around `$state`, exactly as `main` does.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap(actix_web::middleware::from_fn(
                    gatekeep_server::session::session_middleware,
                ))
                .configure(gatekeep_server::routes::configure)
                .default_service(actix_web::web::to(gatekeep_server::routes::not_found)),
        )
        .await
    };
}

pub struct TestContext {
    pub state: AppState,
    pub db: Database,
}

pub async fn memory_database() -> Database {
    let db = Database::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_secs: 5,
    })
    .await
    .expect("Failed to open in-memory database");
    db.migrate().await.expect("Failed to run migrations");
    db
}

pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid Argon2 parameters")
}

/// Application state for `variant` with sessions kept in the SQL store.
pub async fn context(variant: Variant) -> TestContext {
    let db = memory_database().await;
    let store = Arc::new(SqlSessionStore::new(db.clone()));
    context_with_store(variant, db, store)
}

pub fn context_with_store(
    variant: Variant,
    db: Database,
    store: Arc<dyn SessionStore>,
) -> TestContext {
    let config = Settings::defaults().expect("default settings");
    let credentials = credential_store(variant, db.clone(), cheap_hasher());
    TestContext {
        state: AppState::from_parts(config, credentials, store),
        db,
    }
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE)
        .map(|c| c.into_owned())
}

pub async fn session_rows(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn user_rows(db: &Database) -> i64 {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#)
        .fetch_one(db.pool())
        .await
        .unwrap()
}
