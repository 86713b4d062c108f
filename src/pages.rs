//! HTML pages
//!
//! Simple inline HTML templates without a template engine.

/// Images the members page picks from.
pub const CAT_IMAGES: [&str; 3] = ["cat1.jpg", "cat2.jpg", "cat3.jpg"];

const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
        max-width: 640px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    .error {
        color: #b00020;
        margin: 10px 0;
    }
    .form-group {
        margin: 15px 0;
    }
    a.button {
        display: inline-block;
        margin-right: 10px;
        padding: 8px 16px;
        background: #0066cc;
        color: white;
        text-decoration: none;
        border-radius: 4px;
    }
    img {
        max-width: 100%;
    }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#
    )
}

/// Message shown on the signup form for an `error` reason code.
pub fn signup_message(code: Option<&str>) -> Option<&'static str> {
    match code {
        Some("username") => Some("Please provide a username."),
        Some("password") => Some("Please provide a password."),
        _ => None,
    }
}

/// Message shown on the login form for an `error` reason code.
pub fn login_message(code: Option<&str>) -> Option<&'static str> {
    match code {
        Some("invalid") => Some("Username and password not found."),
        other => signup_message(other),
    }
}

fn error_block(message: Option<&str>) -> String {
    message.map_or(String::new(), |m| {
        format!(r#"        <div class="error">{}</div>"#, html_escape(m))
    })
}

/// Landing page; offers signup/login, or members/logout once signed in.
pub fn home_page(username: Option<&str>) -> String {
    let body = match username {
        Some(name) => format!(
            r#"        <h1>Hello, {}!</h1>
        <a class="button" href="/members">Go to Members Area</a>
        <a class="button" href="/logout">Logout</a>"#,
            html_escape(name)
        ),
        None => r#"        <a class="button" href="/signup">Sign Up</a>
        <a class="button" href="/login">Log In</a>"#
            .to_string(),
    };
    layout("Home", &body)
}

fn credentials_form(heading: &str, action: &str, submit: &str, message: Option<&str>) -> String {
    let error_html = error_block(message);
    format!(
        r#"        <h1>{heading}</h1>
{error_html}
        <form method="POST" action="{action}">
            <div class="form-group">
                <input type="text" name="username" placeholder="username">
            </div>
            <div class="form-group">
                <input type="password" name="password" placeholder="password">
            </div>
            <button type="submit">{submit}</button>
        </form>"#
    )
}

pub fn signup_page(error: Option<&str>) -> String {
    layout(
        "Sign Up",
        &credentials_form("Create user", "/signupSubmit", "Submit", signup_message(error)),
    )
}

pub fn login_page(error: Option<&str>) -> String {
    layout(
        "Log In",
        &credentials_form("Log in", "/loginSubmit", "Submit", login_message(error)),
    )
}

/// Members area. With `escape` off the username is inserted verbatim,
/// so markup in a username runs in the visitor's browser.
pub fn members_page(username: &str, image: &str, escape: bool) -> String {
    let name = if escape {
        html_escape(username)
    } else {
        username.to_string()
    };
    let body = format!(
        r#"        <h1>Hello, {name}.</h1>
        <img src="/{}" alt="cat">
        <p><a class="button" href="/logout">Sign out</a></p>"#,
        html_escape(image)
    );
    layout("Members", &body)
}

pub fn not_found_page() -> String {
    layout(
        "Not Found",
        r#"        <h1>Page not found - 404</h1>
        <a class="button" href="/">Home</a>"#,
    )
}

pub fn error_page() -> String {
    layout(
        "Error",
        r#"        <h1>Something went wrong</h1>
        <a class="button" href="/">Home</a>"#,
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
