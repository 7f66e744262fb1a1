use std::collections::HashMap;

use axum::Router;
use axum::extract::{Json, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::time::{Duration, timeout};

use super::*;
use crate::storage::MemoryStorage;

// =============================================================================
// STUB SERVER
// =============================================================================

fn user_json() -> Value {
    json!({
        "id": "u1",
        "aud": "authenticated",
        "email": "test@example.com",
        "role": "authenticated",
        "user_metadata": { "full_name": "Test User" }
    })
}

fn token_json(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-new",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": user_json()
    })
}

fn bad_request(description: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant", "error_description": description })))
        .into_response()
}

async fn token(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
    match query.get("grant_type").map(String::as_str) {
        Some("password") if body["password"] == "password123" => Json(token_json("access-1")).into_response(),
        Some("password") => bad_request("Invalid login credentials"),
        Some("refresh_token") if body["refresh_token"] == "refresh-old" => {
            Json(token_json("access-refreshed")).into_response()
        }
        Some("refresh_token") => bad_request("Invalid Refresh Token: Refresh Token Not Found"),
        Some("pkce") if body["auth_code"] == "good-code" && body["code_verifier"].as_str().is_some_and(|v| !v.is_empty() && !v.contains('/')) => {
            Json(token_json("access-pkce")).into_response()
        }
        Some("pkce") => bad_request("invalid flow state, no valid flow state found"),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn user(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(token) if token.starts_with("access-") => Json(user_json()).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response(),
    }
}

async fn update_user(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers) != Some("access-1") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut user = user_json();
    user["user_metadata"]["password_changed"] = json!(body["password"].is_string());
    Json(user).into_response()
}

async fn logout(headers: HeaderMap) -> StatusCode {
    if bearer(&headers) == Some("access-1") { StatusCode::NO_CONTENT } else { StatusCode::UNAUTHORIZED }
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["code_challenge"].as_str().is_none_or(str::is_empty) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({ "id": "u2", "email": body["email"], "user_metadata": body["data"] })).into_response()
}

async fn recover(Json(body): Json<Value>) -> StatusCode {
    if body["code_challenge"].as_str().is_none_or(str::is_empty) { StatusCode::BAD_REQUEST } else { StatusCode::OK }
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user).put(update_user))
        .route("/auth/v1/logout", post(logout))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/recover", post(recover));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}

fn client_for(base: &str, storage: Arc<MemoryStorage>) -> GoTrueClient {
    let config = AuthConfig::new(base, "anon-key", "https://learn.example.com");
    GoTrueClient::new(config, storage).expect("client builds")
}

fn stored_session(access_token: &str, refresh_token: &str, expires_at: i64) -> String {
    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "token_type": "bearer",
        "expires_at": expires_at,
        "user": user_json()
    })
    .to_string()
}

async fn next_change(feed: &mut ChangeFeed) -> crate::types::AuthChange {
    timeout(Duration::from_millis(500), feed.next())
        .await
        .expect("change feed timed out")
        .expect("change feed closed")
}

// =============================================================================
// PARSING
// =============================================================================

#[test]
fn parse_session_computes_expiry_from_expires_in() {
    let session = parse_session(&token_json("at").to_string(), 1_000).unwrap();
    assert_eq!(session.access_token, "at");
    assert_eq!(session.refresh_token, "refresh-new");
    assert_eq!(session.expires_at, 4_600);
    assert_eq!(session.user.email, "test@example.com");
}

#[test]
fn parse_session_prefers_explicit_expires_at() {
    let mut body = token_json("at");
    body["expires_at"] = json!(42);
    assert_eq!(parse_session(&body.to_string(), 1_000).unwrap().expires_at, 42);
}

#[test]
fn parse_session_rejects_missing_tokens() {
    let err = parse_session(r#"{"user":{"id":"u1"}}"#, 0).unwrap_err();
    assert!(matches!(err, AuthError::Parse(_)));
}

#[test]
fn parse_sign_up_session_when_autoconfirmed() {
    let outcome = parse_sign_up(&token_json("at").to_string(), 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::Session(s) if s.access_token == "at"));
}

#[test]
fn parse_sign_up_bare_user_is_pending() {
    let outcome = parse_sign_up(r#"{"id":"u2","email":"new@example.com"}"#, 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::PendingConfirmation(u) if u.id == "u2"));
}

#[test]
fn parse_sign_up_wrapped_user_is_pending() {
    let outcome = parse_sign_up(r#"{"user":{"id":"u3"},"session":null}"#, 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::PendingConfirmation(u) if u.id == "u3"));
}

#[test]
fn parse_error_reads_known_fields() {
    assert_eq!(
        parse_error(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
        AuthError::Api { status: 400, message: "Invalid login credentials".into() }
    );
    assert_eq!(
        parse_error(422, r#"{"code":422,"msg":"Password should be at least 6 characters"}"#),
        AuthError::Api { status: 422, message: "Password should be at least 6 characters".into() }
    );
    assert_eq!(
        parse_error(429, r#"{"message":"rate limit exceeded"}"#),
        AuthError::Api { status: 429, message: "rate limit exceeded".into() }
    );
}

#[test]
fn parse_error_falls_back_to_raw_body() {
    assert_eq!(
        parse_error(502, " upstream down \n"),
        AuthError::Api { status: 502, message: "upstream down".into() }
    );
}

#[test]
fn authorize_url_carries_provider_redirect_and_challenge() {
    let url = authorize_url(
        "https://abc.supabase.co/auth/v1/authorize",
        OAuthProvider::Github,
        "https://learn.example.com/auth/callback",
        "challenge123",
    )
    .unwrap();
    assert!(url.starts_with("https://abc.supabase.co/auth/v1/authorize?"));
    assert!(url.contains("provider=github"));
    assert!(url.contains("redirect_to=https%3A%2F%2Flearn.example.com%2Fauth%2Fcallback"));
    assert!(url.contains("code_challenge=challenge123"));
    assert!(url.contains("code_challenge_method=s256"));
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[tokio::test]
async fn unconfigured_client_fails_every_call() {
    let client = GoTrueClient::new(AuthConfig::new("", "", ""), Arc::new(MemoryStorage::new())).unwrap();
    assert_eq!(
        client.sign_in_with_password("a@b.com", "secret").await.unwrap_err(),
        AuthError::NotConfigured
    );
    assert_eq!(
        client.sign_in_with_oauth(OAuthProvider::Google, "x").await.unwrap_err(),
        AuthError::NotConfigured
    );
}

#[tokio::test]
async fn get_session_without_stored_session_is_none() {
    let client = client_for("http://127.0.0.1:9", Arc::new(MemoryStorage::new()));
    assert_eq!(client.get_session().await, Ok(None));
    assert_eq!(client.get_user().await, Ok(None));
}

// =============================================================================
// HTTP ROUND TRIPS
// =============================================================================

#[tokio::test]
async fn password_sign_in_persists_and_emits_signed_in() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    let response = client.sign_in_with_password("test@example.com", "password123").await.unwrap();
    assert_eq!(response.session.as_ref().map(|s| s.access_token.as_str()), Some("access-1"));
    assert!(storage.get_item(SESSION_KEY).is_some());

    let change = next_change(&mut feed).await;
    assert_eq!(change.event, AuthEvent::SignedIn);
    assert!(change.session.is_some());

    let user = client.get_user().await.unwrap().expect("user resolved");
    assert_eq!(user.display_name(), Some("Test User"));
}

#[tokio::test]
async fn password_sign_in_failure_stores_nothing() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client_for(&base, storage.clone());

    let err = client.sign_in_with_password("test@example.com", "wrong").await.unwrap_err();
    assert_eq!(err, AuthError::Api { status: 400, message: "Invalid login credentials".into() });
    assert!(storage.get_item(SESSION_KEY).is_none());
}

#[tokio::test]
async fn expired_session_is_refreshed_on_read() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(SESSION_KEY, &stored_session("access-old", "refresh-old", 0));
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    let session = client.get_session().await.unwrap().expect("session");
    assert_eq!(session.access_token, "access-refreshed");
    assert_eq!(next_change(&mut feed).await.event, AuthEvent::TokenRefreshed);

    let persisted: Session = serde_json::from_str(&storage.get_item(SESSION_KEY).unwrap()).unwrap();
    assert_eq!(persisted.access_token, "access-refreshed");
}

#[tokio::test]
async fn rejected_refresh_clears_session_and_signs_out() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(SESSION_KEY, &stored_session("access-old", "refresh-revoked", 0));
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    assert!(matches!(client.get_session().await, Err(AuthError::Api { status: 400, .. })));
    assert!(storage.get_item(SESSION_KEY).is_none());
    assert_eq!(next_change(&mut feed).await.event, AuthEvent::SignedOut);
}

#[tokio::test]
async fn auto_refresh_disabled_returns_stale_session() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(SESSION_KEY, &stored_session("access-old", "refresh-old", 0));
    let mut config = AuthConfig::new(&base, "anon-key", "https://learn.example.com");
    config.auto_refresh = false;
    let client = GoTrueClient::new(config, storage).unwrap();

    let session = client.get_session().await.unwrap().expect("session");
    assert_eq!(session.access_token, "access-old");
}

#[tokio::test]
async fn exchange_without_verifier_fails_before_request() {
    let client = client_for("http://127.0.0.1:9", Arc::new(MemoryStorage::new()));
    assert_eq!(
        client.exchange_code_for_session("good-code").await.unwrap_err(),
        AuthError::MissingCodeVerifier
    );
}

#[tokio::test]
async fn oauth_then_exchange_completes_pkce_flow() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    let redirect = client
        .sign_in_with_oauth(OAuthProvider::Github, "https://learn.example.com/auth/callback")
        .await
        .unwrap();
    assert_eq!(redirect.provider, OAuthProvider::Github);
    let verifier = storage.get_item(CODE_VERIFIER_KEY).expect("verifier stored");
    assert!(redirect.url.contains(&pkce::challenge(&verifier)));

    let response = client.exchange_code_for_session("good-code").await.unwrap();
    assert_eq!(response.session.map(|s| s.access_token), Some("access-pkce".to_owned()));
    assert!(storage.get_item(CODE_VERIFIER_KEY).is_none());
    assert_eq!(next_change(&mut feed).await.event, AuthEvent::SignedIn);
}

#[tokio::test]
async fn recovery_exchange_emits_password_recovery() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    client
        .reset_password_for_email("test@example.com", "https://learn.example.com/reset-password")
        .await
        .unwrap();
    assert!(storage.get_item(CODE_VERIFIER_KEY).is_some_and(|v| v.ends_with(RECOVERY_MARKER)));

    let response = client.exchange_code_for_session("good-code").await.unwrap();
    assert_eq!(response.session.map(|s| s.access_token), Some("access-pkce".to_owned()));
    assert!(storage.get_item(CODE_VERIFIER_KEY).is_none());
    let change = next_change(&mut feed).await;
    assert_eq!(change.event, AuthEvent::PasswordRecovery);
    assert!(change.session.is_some());
}

#[test]
fn stored_verifier_marker_selects_exchange_event() {
    assert_eq!(split_stored_verifier("abc-123"), ("abc-123", AuthEvent::SignedIn));
    assert_eq!(
        split_stored_verifier("abc-123/PASSWORD_RECOVERY"),
        ("abc-123", AuthEvent::PasswordRecovery)
    );
}

#[tokio::test]
async fn sign_up_pending_confirmation_has_no_session() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client_for(&base, storage.clone());
    let metadata = SignUpMetadata { full_name: Some("New Learner".into()) };

    let response = client
        .sign_up("new@example.com", "password123", Some(&metadata), "https://learn.example.com/auth/callback")
        .await
        .unwrap();
    assert!(response.session.is_none());
    let user = response.user.expect("pending user");
    assert_eq!(user.email, "new@example.com");
    assert_eq!(user.display_name(), Some("New Learner"));
    assert!(storage.get_item(SESSION_KEY).is_none());
}

#[tokio::test]
async fn update_password_refreshes_stored_user_and_emits() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(SESSION_KEY, &stored_session("access-1", "refresh-1", i64::MAX / 2));
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    let user = client.update_user_password("n3w-secret").await.unwrap();
    assert_eq!(user.user_metadata.get("password_changed"), Some(&json!(true)));
    assert_eq!(next_change(&mut feed).await.event, AuthEvent::UserUpdated);
}

#[tokio::test]
async fn update_password_requires_session() {
    let client = client_for("http://127.0.0.1:9", Arc::new(MemoryStorage::new()));
    assert_eq!(client.update_user_password("x").await.unwrap_err(), AuthError::MissingSession);
}

#[tokio::test]
async fn sign_out_clears_session_even_when_token_rejected() {
    let base = spawn_stub().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item(SESSION_KEY, &stored_session("access-revoked", "refresh-1", i64::MAX / 2));
    let client = client_for(&base, storage.clone());
    let mut feed = client.on_auth_state_change();

    assert_eq!(client.sign_out().await, Ok(()));
    assert!(storage.get_item(SESSION_KEY).is_none());
    let change = next_change(&mut feed).await;
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert!(change.session.is_none());
}
