//! Session Lifecycle Manager
//!
//! A browser is *anonymous* until a signup or login succeeds, then
//! *authenticated* until it logs out or the store expires its record.
//!
//! The session document lives in a [`SessionStore`]; the browser only holds
//! a signed cookie carrying the session id. Nothing is written for anonymous
//! visitors. [`session_middleware`] loads the session before each handler
//! and persists it afterwards according to the [`SessionPolicy`].

use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha512};
use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::credentials::Variant;
use crate::db::SessionRecord;
use crate::error::{AppError, AuthError, SessionError};

pub mod middleware;
pub mod store;

pub use middleware::session_middleware;
pub use store::{MemorySessionStore, SessionStore, SqlSessionStore};

/// When and for how long sessions are persisted.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub max_age: Duration,
    /// Rewrite the stored record on every request even when unmodified,
    /// sliding its expiry forward.
    pub resave: bool,
}

impl SessionPolicy {
    pub fn for_variant(variant: Variant, max_age_secs: i64) -> Self {
        Self {
            max_age: Duration::seconds(max_age_secs),
            resave: variant.resaves_sessions(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionStatus {
    Unchanged,
    Changed,
    Purged,
}

#[derive(Debug)]
struct SessionInner {
    id: Option<String>,
    authenticated: bool,
    username: Option<String>,
    status: SessionStatus,
}

/// Per-request session handle, extracted in handlers.
#[derive(Debug, Clone)]
pub struct Session(Rc<RefCell<SessionInner>>);

impl Session {
    pub(crate) fn anonymous() -> Self {
        Self(Rc::new(RefCell::new(SessionInner {
            id: None,
            authenticated: false,
            username: None,
            status: SessionStatus::Unchanged,
        })))
    }

    pub(crate) fn from_record(record: SessionRecord) -> Self {
        Self(Rc::new(RefCell::new(SessionInner {
            id: Some(record.id),
            authenticated: record.authenticated,
            username: record.username,
            status: SessionStatus::Unchanged,
        })))
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.borrow().authenticated
    }

    pub fn username(&self) -> Option<String> {
        self.0.borrow().username.clone()
    }

    pub fn id(&self) -> Option<String> {
        self.0.borrow().id.clone()
    }

    /// Username of an authenticated session, or an error for anonymous ones.
    pub fn require_authenticated(&self) -> Result<String, AuthError> {
        let inner = self.0.borrow();
        match (&inner.username, inner.authenticated) {
            (Some(username), true) => Ok(username.clone()),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    /// Mark the session as belonging to `username`.
    pub fn authenticate(&self, username: &str) {
        let mut inner = self.0.borrow_mut();
        inner.authenticated = true;
        inner.username = Some(username.to_string());
        inner.status = SessionStatus::Changed;
    }

    pub(crate) fn purge(&self) {
        let mut inner = self.0.borrow_mut();
        inner.authenticated = false;
        inner.username = None;
        inner.status = SessionStatus::Purged;
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.0.borrow().status
    }

    /// Record to persist, assigning an id on first save.
    pub(crate) fn to_record(&self, max_age: Duration) -> SessionRecord {
        let mut inner = self.0.borrow_mut();
        let id = inner
            .id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        SessionRecord {
            id,
            authenticated: inner.authenticated,
            username: inner.username.clone(),
            expires_at: Utc::now() + max_age,
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req
            .extensions()
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::SessionError(SessionError::MissingMiddleware).into());
        ready(session)
    }
}

/// Owns the store handle, the persistence policy and the cookie key.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    policy: SessionPolicy,
    key: Key,
    cookie_name: String,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        policy: SessionPolicy,
        secret: &str,
        cookie_name: impl Into<String>,
    ) -> Self {
        // SHA-512 stretches any secret to the 64 bytes the cookie key needs.
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            store,
            policy,
            key: Key::from(digest.as_slice()),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session id from a cookie whose signature checks out.
    pub(crate) fn verify_cookie(&self, cookie: Cookie<'static>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        jar.signed(&self.key)
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
    }

    pub(crate) fn session_cookie(&self, id: &str) -> Option<Cookie<'static>> {
        let cookie = Cookie::build(self.cookie_name.clone(), id.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(actix_web::cookie::time::Duration::seconds(
                self.policy.max_age.num_seconds(),
            ))
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(&self.cookie_name).cloned()
    }

    pub(crate) fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "").path("/").finish();
        cookie.make_removal();
        cookie
    }

    /// Load the session behind `id`; store failures degrade to anonymous.
    pub async fn load(&self, id: &str) -> Session {
        match self.store.load(id).await {
            Ok(Some(record)) => Session::from_record(record),
            Ok(None) => {
                debug!("No live session for presented cookie");
                Session::anonymous()
            }
            Err(e) => {
                error!("Failed to load session: {}", e);
                Session::anonymous()
            }
        }
    }

    /// Write the session to the store. Returns whether it was persisted.
    pub async fn save(&self, session: &Session) -> bool {
        let record = session.to_record(self.policy.max_age);
        match self.store.save(&record).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save session: {}", e);
                false
            }
        }
    }

    /// Log the session out.
    ///
    /// The handle is cleared whatever the store says; a failed destroy is
    /// only logged.
    pub async fn destroy(&self, session: &Session) {
        if let Some(id) = session.id() {
            if let Err(e) = self.store.destroy(&id).await {
                error!("Failed to destroy session: {}", e);
            }
        }
        session.purge();
    }

    /// One pass of the expired-session sweep.
    pub async fn sweep_expired(&self) -> u64 {
        match self.store.cleanup_expired().await {
            Ok(0) => 0,
            Ok(removed) => {
                info!("Removed {} expired sessions", removed);
                removed
            }
            Err(e) => {
                error!("Expired session sweep failed: {}", e);
                0
            }
        }
    }
}
