use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use gatehouse::app::build_app;
use gatehouse::state::AppState;
use gatehouse::testing::{MemoryUserStore, RecordingMailer, SentEmail};

const GENERIC_RESET_MESSAGE: &str = "If the email is registered, you will receive a reset link.";

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8_lossy(&bytes).to_string()
}

fn app_with_recorder() -> (Router, Arc<RecordingMailer>) {
    let store = Arc::new(MemoryUserStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let app = build_app(AppState::fake_with(store, mailer.clone()));
    (app, mailer)
}

async fn register(app: &Router, email: &str, password: &str) {
    let response = app
        .clone()
        .oneshot(form_post(
            "/register",
            &format!("email={}&password={}", email, password),
        ))
        .await
        .expect("register request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

async fn login_status(app: &Router, email: &str, password: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(form_post(
            "/login",
            &format!("email={}&password={}", email, password),
        ))
        .await
        .expect("login request");
    response.status()
}

/// Pull the token out of the reset link in a recorded email body.
fn reset_token_from(mail: &SentEmail) -> String {
    let marker = "?token=";
    let start = mail
        .html_body
        .find(marker)
        .expect("reset link in email body")
        + marker.len();
    let rest = &mail.html_body[start..];
    let end = rest.find('"').expect("closing quote after token");
    rest[..end].to_string()
}

async fn request_reset_token(app: &Router, mailer: &RecordingMailer, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(form_post("/forgot-password", &format!("email={}", email)))
        .await
        .expect("forgot-password request");
    assert_eq!(response.status(), StatusCode::OK);
    let sent = mailer.sent.lock().expect("mailer lock");
    let mail = sent.last().expect("a recorded email");
    assert_eq!(mail.to, email);
    reset_token_from(mail)
}

#[tokio::test]
async fn full_reset_flow_rotates_the_password() {
    let (app, mailer) = app_with_recorder();
    register(&app, "alice@example.com", "Secret123!").await;

    let response = app
        .clone()
        .oneshot(form_post("/forgot-password", "email=alice@example.com"))
        .await
        .expect("forgot-password request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(GENERIC_RESET_MESSAGE));

    let token = {
        let sent = mailer.sent.lock().expect("mailer lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Reset Your Password");
        reset_token_from(&sent[0])
    };

    let response = app
        .clone()
        .oneshot(get(&format!("/reset-password?token={}", token)))
        .await
        .expect("reset page request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains("Invalid or expired token."));
    assert!(body.contains("name=\"password\""));

    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=NewPass456!", token),
        ))
        .await
        .expect("reset confirm request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Password reset successful."));

    assert_eq!(
        login_status(&app, "alice@example.com", "Secret123!").await,
        StatusCode::OK
    );
    assert_eq!(
        login_status(&app, "alice@example.com", "NewPass456!").await,
        StatusCode::SEE_OTHER
    );
}

#[tokio::test]
async fn unknown_email_gets_the_same_answer_and_no_mail() {
    let (app, mailer) = app_with_recorder();
    register(&app, "alice@example.com", "Secret123!").await;

    let known = app
        .clone()
        .oneshot(form_post("/forgot-password", "email=alice@example.com"))
        .await
        .expect("forgot-password request");
    let unknown = app
        .clone()
        .oneshot(form_post("/forgot-password", "email=nobody@example.com"))
        .await
        .expect("forgot-password request");

    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);
    assert_eq!(body_text(known).await, body_text(unknown).await);

    let sent = mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), 1, "only the registered address gets mail");
}

#[tokio::test]
async fn tampered_token_leaves_the_password_alone() {
    let (app, mailer) = app_with_recorder();
    register(&app, "alice@example.com", "Secret123!").await;
    let token = request_reset_token(&app, &mailer, "alice@example.com").await;

    let mut tampered = token.clone();
    let flipped = if tampered.ends_with('x') { 'y' } else { 'x' };
    tampered.pop();
    tampered.push(flipped);

    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=NewPass456!", tampered),
        ))
        .await
        .expect("reset confirm request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Invalid or expired token."));

    assert_eq!(
        login_status(&app, "alice@example.com", "Secret123!").await,
        StatusCode::SEE_OTHER
    );
}

#[tokio::test]
async fn consumed_token_is_dead_in_both_directions() {
    let (app, mailer) = app_with_recorder();
    register(&app, "alice@example.com", "Secret123!").await;
    let token = request_reset_token(&app, &mailer, "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=NewPass456!", token),
        ))
        .await
        .expect("reset confirm request");
    assert!(body_text(response).await.contains("Password reset successful."));

    let response = app
        .clone()
        .oneshot(get(&format!("/reset-password?token={}", token)))
        .await
        .expect("reset page request");
    assert!(body_text(response).await.contains("Invalid or expired token."));

    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=Another789!", token),
        ))
        .await
        .expect("reset confirm request");
    assert!(body_text(response).await.contains("Invalid or expired token."));

    assert_eq!(
        login_status(&app, "alice@example.com", "NewPass456!").await,
        StatusCode::SEE_OTHER
    );
}

#[tokio::test]
async fn fresh_request_after_a_consumed_cycle_works() {
    let (app, mailer) = app_with_recorder();
    register(&app, "alice@example.com", "Secret123!").await;

    let first = request_reset_token(&app, &mailer, "alice@example.com").await;
    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=NewPass456!", first),
        ))
        .await
        .expect("reset confirm request");
    assert!(body_text(response).await.contains("Password reset successful."));

    let second = request_reset_token(&app, &mailer, "alice@example.com").await;
    let response = app
        .clone()
        .oneshot(form_post(
            "/reset-password",
            &format!("token={}&password=Another789!", second),
        ))
        .await
        .expect("reset confirm request");
    assert!(body_text(response).await.contains("Password reset successful."));

    assert_eq!(
        login_status(&app, "alice@example.com", "Another789!").await,
        StatusCode::SEE_OTHER
    );
}
