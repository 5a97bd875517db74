//! End-to-end tests for the password-reset lifecycle, driven through the
//! HTTP surface with a recording mailer.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use reserva::api::AppState;
use reserva::config::Config;
use reserva::entities::{password_reset_attempts, password_reset_tokens};
use reserva::mailer::LogMailer;
use reserva::state::SharedState;
use sea_orm::{EntityTrait, Set};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<AppState>, Router, Arc<LogMailer>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let mailer = Arc::new(LogMailer::default());
    let shared = SharedState::with_mailer(config, mailer.clone())
        .await
        .expect("failed to create app state");
    let state = reserva::api::create_app_state(Arc::new(shared));
    let router = reserva::api::router(state.clone()).await;
    (state, router, mailer)
}

async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, email: &str) {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({
            "username": username,
            "email": email,
            "password": "original-password",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
}

async fn latest_token(state: &Arc<AppState>) -> String {
    let rows = password_reset_tokens::Entity::find()
        .all(&state.store().conn)
        .await
        .unwrap();
    rows.last().expect("no reset token issued").token.clone()
}

async fn attempt_count(state: &Arc<AppState>) -> usize {
    password_reset_attempts::Entity::find()
        .all(&state.store().conn)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn full_reset_flow_rotates_the_password() {
    let (state, app, mailer) = spawn_app().await;
    register(&app, "frank", "frank@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "frank@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "request failed: {body}");
    assert_eq!(
        body["data"]["message"],
        "Password reset email sent successfully. Please check your inbox."
    );

    // Exactly one email went out, to the right address.
    let sent = mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "frank@example.com");
    assert_eq!(sent[0].1, "Reset Your Password");
    drop(sent);

    let token = latest_token(&state).await;
    assert_eq!(token.len(), 43);

    // The token validates without being consumed.
    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/validate",
        serde_json::json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);

    // Validation is not consumption: it still validates a second time.
    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/validate",
        serde_json::json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Too-short replacement password is rejected.
    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/confirm",
        serde_json::json!({ "token": token, "new_password": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/confirm",
        serde_json::json!({ "token": token, "new_password": "rotated-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works; the new one does.
    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        serde_json::json!({ "username": "frank", "password": "original-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        serde_json::json!({ "username": "frank", "password": "rotated-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn consumed_token_stays_consumed() {
    let (state, app, _mailer) = spawn_app().await;
    register(&app, "grace", "grace@example.com").await;

    post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "grace@example.com" }),
    )
    .await;
    let token = latest_token(&state).await;

    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/confirm",
        serde_json::json!({ "token": token, "new_password": "first-rotation" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The used token no longer validates.
    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/validate",
        serde_json::json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Token has expired or already been used.");
    assert_eq!(body["valid"], false);

    // A second confirmation fails and leaves the password alone.
    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/confirm",
        serde_json::json!({ "token": token, "new_password": "second-rotation" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        serde_json::json!({ "username": "grace", "password": "first-rotation" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn garbage_token_is_distinguished_from_a_spent_one() {
    let (_state, app, _mailer) = spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/validate",
        serde_json::json!({ "token": "never-issued" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token.");
    assert_eq!(body["valid"], false);

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/confirm",
        serde_json::json!({ "token": "never-issued", "new_password": "whatever-works" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token.");

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/validate",
        serde_json::json!({ "token": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn unknown_email_leaves_no_attempt_row() {
    let (state, app, mailer) = spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "stranger@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No user found with this email address.");

    // Rejected lookups never count against the rate limit.
    assert_eq!(attempt_count(&state).await, 0);
    assert!(mailer.sent.lock().await.is_empty());
}

#[tokio::test]
async fn fourth_request_in_window_is_rate_limited() {
    let (state, app, mailer) = spawn_app().await;
    register(&app, "heidi", "heidi@example.com").await;

    for _ in 0..3 {
        let (status, _) = post_json(
            &app,
            "/api/auth/password-reset/request",
            serde_json::json!({ "email": "heidi@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(attempt_count(&state).await, 3);
    assert_eq!(mailer.sent.lock().await.len(), 3);

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "heidi@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let remaining = body["seconds_remaining"].as_i64().unwrap();
    assert!(remaining > 0 && remaining <= 600, "remaining = {remaining}");
    assert!(
        body["error"].as_str().unwrap().contains("Please wait"),
        "unexpected body: {body}"
    );

    // The blocked request recorded nothing and sent nothing.
    assert_eq!(attempt_count(&state).await, 3);
    assert_eq!(mailer.sent.lock().await.len(), 3);

    // Another account is unaffected.
    register(&app, "ivan", "ivan@example.com").await;
    let (status, _) = post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "ivan@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn aged_attempts_no_longer_block() {
    let (state, app, mailer) = spawn_app().await;
    register(&app, "judy", "judy@example.com").await;

    // Three attempts just outside the 10-minute window, inserted directly.
    let stale = reserva::db::fmt_utc(chrono::Utc::now() - chrono::Duration::minutes(11));
    for _ in 0..3 {
        let row = password_reset_attempts::ActiveModel {
            email: Set("judy@example.com".to_string()),
            created_at: Set(stale.clone()),
            ..Default::default()
        };
        password_reset_attempts::Entity::insert(row)
            .exec(&state.store().conn)
            .await
            .unwrap();
    }
    assert_eq!(attempt_count(&state).await, 3);

    let (status, body) = post_json(
        &app,
        "/api/auth/password-reset/request",
        serde_json::json!({ "email": "judy@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "aged attempts blocked: {body}");
    assert_eq!(mailer.sent.lock().await.len(), 1);

    // The fresh attempt was recorded and the aged rows compacted away.
    assert_eq!(attempt_count(&state).await, 1);
}
