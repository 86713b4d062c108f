use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpMessage};
use tracing::debug;

use super::{Session, SessionStatus};
use crate::error::AppError;
use crate::AppState;

/// Load the session before the handler runs and persist it afterwards.
///
/// * modified sessions are saved and the signed cookie is (re)issued;
/// * unmodified live sessions are rewritten only when the policy resaves;
/// * purged sessions get a removal cookie.
pub async fn session_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("Application state is not registered".into()))?;
    let manager = state.sessions.clone();

    let presented = req
        .request()
        .cookie(manager.cookie_name())
        .and_then(|cookie| manager.verify_cookie(cookie));

    let session = match presented {
        Some(id) => manager.load(&id).await,
        None => Session::anonymous(),
    };
    let had_live_session = session.id().is_some();
    req.extensions_mut().insert(session.clone());

    let mut res = next.call(req).await?;

    match session.status() {
        SessionStatus::Changed => {
            if manager.save(&session).await {
                if let Some(id) = session.id() {
                    if let Some(cookie) = manager.session_cookie(&id) {
                        res.response_mut().add_cookie(&cookie)?;
                    }
                }
            }
        }
        SessionStatus::Unchanged if had_live_session && manager.policy().resave => {
            debug!("Re-saving unmodified session");
            manager.save(&session).await;
        }
        SessionStatus::Unchanged => {}
        SessionStatus::Purged => {
            res.response_mut().add_cookie(&manager.removal_cookie())?;
        }
    }

    Ok(res)
}
