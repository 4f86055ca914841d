use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register_submit),
        )
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/logout", post(handlers::logout))
        .route("/dashboard", get(handlers::dashboard_page))
        .route(
            "/forgot-password",
            get(handlers::forgot_password_page).post(handlers::forgot_password_submit),
        )
        .route(
            "/reset-password",
            get(handlers::reset_password_page).post(handlers::reset_password_submit),
        )
}
