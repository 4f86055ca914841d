use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, instrument, warn};

use crate::auth::dto::{
    ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm, ResetPasswordQuery,
};
use crate::auth::middleware::{CurrentUser, SESSION_COOKIE};
use crate::error::AuthError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub message: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub token: String,
    pub message: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user_id: String,
    pub email: String,
    pub joined: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie(token: String, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

fn render_login(error: Option<String>) -> Html<String> {
    Html(LoginTemplate { error }.render().unwrap_or_default())
}

fn render_register(error: Option<String>) -> Html<String> {
    Html(RegisterTemplate { error }.render().unwrap_or_default())
}

fn render_forgot_password(message: Option<String>) -> Html<String> {
    Html(ForgotPasswordTemplate { message }.render().unwrap_or_default())
}

fn render_reset_password(token: String, message: Option<String>) -> Html<String> {
    Html(
        ResetPasswordTemplate { token, message }
            .render()
            .unwrap_or_default(),
    )
}

/// GET /register
pub async fn register_page() -> Html<String> {
    render_register(None)
}

/// POST /register
#[instrument(skip(state, form))]
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if !is_valid_email(&form.email) {
        warn!(email = %form.email, "invalid email");
        return render_register(Some("Invalid email".to_string())).into_response();
    }
    if form.password.len() < 8 {
        warn!("password too short");
        return render_register(Some("Password too short".to_string())).into_response();
    }

    match state.auth.register(&form.email, &form.password).await {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(AuthError::EmailTaken) => {
            render_register(Some("Email already registered".to_string())).into_response()
        }
        Err(e) => {
            error!(error = %e, "register failed");
            render_register(Some("An error occurred. Please try again.".to_string()))
                .into_response()
        }
    }
}

/// GET /login
pub async fn login_page() -> Html<String> {
    render_login(None)
}

/// POST /login
#[instrument(skip(state, jar, form))]
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !is_valid_email(&form.email) {
        warn!(email = %form.email, "invalid email");
        return render_login(Some("Invalid email".to_string())).into_response();
    }

    match state.auth.login(&form.email, &form.password).await {
        Ok((_user, token)) => {
            let cookie = session_cookie(
                token,
                state.config.token.session_ttl_hours,
                state.config.secure_cookies,
            );
            (jar.add(cookie), Redirect::to("/dashboard")).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            render_login(Some("Invalid credentials".to_string())).into_response()
        }
        Err(e) => {
            error!(error = %e, "login failed");
            render_login(Some("An error occurred. Please try again.".to_string())).into_response()
        }
    }
}

/// POST /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build();
    (jar.remove(cookie), Redirect::to("/login"))
}

/// GET /dashboard
pub async fn dashboard_page(CurrentUser(user): CurrentUser) -> Html<String> {
    let template = DashboardTemplate {
        user_id: user.id.to_string(),
        email: user.email,
        joined: user.created_at.date().to_string(),
    };
    Html(template.render().unwrap_or_default())
}

/// GET /forgot-password
pub async fn forgot_password_page() -> Html<String> {
    render_forgot_password(None)
}

/// POST /forgot-password
#[instrument(skip(state, form))]
pub async fn forgot_password_submit(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Html<String> {
    state.auth.request_reset(&form.email).await;
    render_forgot_password(Some(
        "If the email is registered, you will receive a reset link.".to_string(),
    ))
}

/// GET /reset-password
#[instrument(skip(state, query))]
pub async fn reset_password_page(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordQuery>,
) -> Html<String> {
    let message = match query.token.as_deref() {
        Some(token) => match state.auth.validate_reset_token(token).await {
            Ok(_) => None,
            Err(_) => Some("Invalid or expired token.".to_string()),
        },
        None => Some("Invalid or expired token.".to_string()),
    };
    render_reset_password(query.token.unwrap_or_default(), message)
}

/// POST /reset-password
#[instrument(skip(state, form))]
pub async fn reset_password_submit(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Html<String> {
    if form.password.len() < 8 {
        warn!("password too short");
        return render_reset_password(form.token, Some("Password too short".to_string()));
    }

    let message = match state.auth.confirm_reset(&form.token, &form.password).await {
        Ok(()) => "Password reset successful.".to_string(),
        Err(AuthError::InvalidOrExpiredToken) => "Invalid or expired token.".to_string(),
        Err(e) => {
            error!(error = %e, "password reset failed");
            "An error occurred. Please try again.".to_string()
        }
    };
    render_reset_password(form.token, Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn rejects_implausible_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice @example.com"));
        assert!(!is_valid_email("@example.com"));
    }
}
