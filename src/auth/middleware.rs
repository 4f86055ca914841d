use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::auth::service::AuthService;
use crate::auth::store::User;

pub const SESSION_COOKIE: &str = "token";

/// Redirect decision from cookie presence and path alone. Token validity is
/// not checked here; protected pages verify the token themselves before
/// rendering anything.
pub fn guard_redirect(has_session_cookie: bool, path: &str) -> Option<&'static str> {
    if has_session_cookie && (path == "/login" || path == "/register") {
        return Some("/dashboard");
    }
    if !has_session_cookie && path == "/dashboard" {
        return Some("/login");
    }
    None
}

/// Runs on every request, before the handlers.
pub async fn route_guard(req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let has_cookie = jar.get(SESSION_COOKIE).is_some();
    if let Some(target) = guard_redirect(has_cookie, req.uri().path()) {
        return Redirect::to(target).into_response();
    }
    next.run(req).await
}

/// Authenticated request context. Add this as a handler parameter to
/// require a verified session; anything else bounces to the login page.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthService::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Redirect::to("/login").into_response())?;
        let user = auth
            .current_user(&token)
            .await
            .map_err(|_| Redirect::to("/login").into_response())?;
        Ok(CurrentUser(user))
    }
}
