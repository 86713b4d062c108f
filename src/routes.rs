use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse};
use rand::Rng;
use serde::Deserialize;

use crate::auth::handlers::{login_submit, logout, signup_submit};
use crate::pages;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

pub async fn home(session: Session) -> HttpResponse {
    let username = session.require_authenticated().ok();
    html(pages::home_page(username.as_deref()))
}

pub async fn signup(query: web::Query<ErrorQuery>) -> HttpResponse {
    html(pages::signup_page(query.error.as_deref()))
}

pub async fn login(query: web::Query<ErrorQuery>) -> HttpResponse {
    html(pages::login_page(query.error.as_deref()))
}

/// Guarded: anonymous visitors are sent home without explanation.
pub async fn members(session: Session, state: web::Data<AppState>) -> HttpResponse {
    let Ok(username) = session.require_authenticated() else {
        return redirect("/");
    };

    let image = pages::CAT_IMAGES[rand::thread_rng().gen_range(0..pages::CAT_IMAGES.len())];
    html(pages::members_page(
        &username,
        image,
        state.variant.escapes_member_markup(),
    ))
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::html())
        .body(pages::not_found_page())
}

/// Register every route. The session middleware and the 404 fallback are
/// attached at the `App` level.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/signup", web::get().to(signup))
        .route("/signupSubmit", web::post().to(signup_submit))
        .route("/login", web::get().to(login))
        .route("/loginSubmit", web::post().to(login_submit))
        .route("/members", web::get().to(members))
        .route("/logout", web::get().to(logout));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_redirect_is_found() {
        let response = redirect("/login?error=invalid");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?error=invalid"
        );
    }

    #[actix_web::test]
    async fn test_form_pages_render_messages() {
        let app = test::init_service(
            App::new()
                .route("/signup", web::get().to(signup))
                .route("/login", web::get().to(login))
                .default_service(web::to(not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/signup?error=password").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(String::from_utf8_lossy(&body).contains("Please provide a password."));

        let req = test::TestRequest::get().uri("/login?error=invalid").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(String::from_utf8_lossy(&body).contains("Username and password not found."));

        let req = test::TestRequest::get().uri("/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
