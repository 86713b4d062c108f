use actix_web::{web, HttpResponse};
use tracing::{error, info, warn};

use super::service::CredentialsForm;
use crate::error::AppError;
use crate::routes::redirect;
use crate::session::Session;
use crate::AppState;

/// `POST /signupSubmit`
pub async fn signup_submit(
    form: web::Form<CredentialsForm>,
    session: Session,
    state: web::Data<AppState>,
) -> HttpResponse {
    match state.auth.signup(&form).await {
        Ok(username) => {
            session.authenticate(&username);
            redirect("/members")
        }
        Err(AppError::ValidationError(reason)) => {
            info!("Signup rejected: {}", reason);
            redirect(&format!("/signup?error={}", reason.reason()))
        }
        Err(e) => {
            error!("Signup failed: {}", e);
            redirect("/signup")
        }
    }
}

/// `POST /loginSubmit`
pub async fn login_submit(
    form: web::Form<CredentialsForm>,
    session: Session,
    state: web::Data<AppState>,
) -> HttpResponse {
    match state.auth.login(&form).await {
        Ok(username) => {
            session.authenticate(&username);
            redirect("/members")
        }
        Err(AppError::ValidationError(reason)) => {
            info!("Login rejected: {}", reason);
            redirect(&format!("/login?error={}", reason.reason()))
        }
        Err(AppError::AuthError(e)) => {
            warn!("Login failed: {}", e);
            redirect("/login?error=invalid")
        }
        Err(e) => {
            error!("Login failed: {}", e);
            redirect("/login?error=invalid")
        }
    }
}

/// `GET /logout` always lands on the home page, whatever the store reports.
pub async fn logout(session: Session, state: web::Data<AppState>) -> HttpResponse {
    if let Some(username) = session.username() {
        info!("Logging out {:?}", username);
    }
    state.sessions.destroy(&session).await;
    redirect("/")
}
