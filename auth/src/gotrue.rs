//! GoTrue (Supabase Auth) REST client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Thin HTTP wrapper over `{url}/auth/v1`. Sessions are persisted through a
//! [`SessionStorage`] so a page reload (or process restart) resumes the
//! signed-in state, and every session mutation is published on the change
//! feed. All sign-in flows that round-trip through email or a third party use
//! PKCE: the verifier stays in storage and `exchange_code_for_session` trades
//! the returned `code` for tokens.
//!
//! Response parsing lives in free functions so it can be tested without a
//! server.

use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::pkce;
use crate::provider::{ChangeEmitter, ChangeFeed, IdentityProvider};
use crate::runtime::now_unix;
use crate::storage::{CODE_VERIFIER_KEY, SESSION_KEY, SessionStorage};
use crate::types::{AuthEvent, AuthResponse, Identity, OAuthProvider, OAuthRedirect, Session, SignUpMetadata};

/// Appended to a stored verifier issued by the recovery flow.
const RECOVERY_MARKER: &str = "/PASSWORD_RECOVERY";

/// Refresh sessions expiring within this many seconds.
pub const EXPIRY_MARGIN_SECS: i64 = 10;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoTrueClient {
    http: reqwest::Client,
    config: AuthConfig,
    storage: Arc<dyn SessionStorage>,
    changes: ChangeEmitter,
}

impl GoTrueClient {
    /// Build a client. Succeeds even when unconfigured; calls then fail with
    /// `AuthError::NotConfigured`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: AuthConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, AuthError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
        let http = builder.build().map_err(|e| AuthError::Request(e.to_string()))?;

        Ok(Self { http, config, storage, changes: ChangeEmitter::new() })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<String, AuthError> {
        if !self.config.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        Ok(format!("{}/auth/v1{path}", self.config.url))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<String, AuthError> {
        let url = self.endpoint(path)?;
        let token = bearer.unwrap_or(&self.config.anon_key);

        let mut request = self
            .http
            .request(method, url)
            .query(query)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {token}"));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(parse_error(status, &text));
        }
        Ok(text)
    }

    // -------------------------------------------------------------------------
    // persistence
    // -------------------------------------------------------------------------

    fn stored_session(&self) -> Option<Session> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                self.storage.remove_item(SESSION_KEY);
                None
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.storage.set_item(SESSION_KEY, &raw);
        Ok(())
    }

    fn clear_session(&self) {
        self.storage.remove_item(SESSION_KEY);
    }

    /// Create and persist a fresh verifier, returning its challenge.
    ///
    /// `exchange_event` is what the later code exchange publishes; recovery
    /// flows mark the stored verifier so the exchange reports
    /// `PasswordRecovery` instead of `SignedIn`.
    fn begin_pkce(&self, exchange_event: AuthEvent) -> String {
        let verifier = pkce::generate_verifier();
        let stored = match exchange_event {
            AuthEvent::PasswordRecovery => format!("{verifier}{RECOVERY_MARKER}"),
            _ => verifier.clone(),
        };
        self.storage.set_item(CODE_VERIFIER_KEY, &stored);
        pkce::challenge(&verifier)
    }

    fn commit_session(&self, session: Session, event: AuthEvent) -> Result<AuthResponse, AuthError> {
        self.save_session(&session)?;
        self.changes.emit(event, Some(session.clone()));
        Ok(AuthResponse { user: Some(session.user.clone()), session: Some(session) })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let body = RefreshBody { refresh_token };
        let text = self
            .send(Method::POST, "/token", &[("grant_type", "refresh_token")], Some(&body), None)
            .await?;
        let session = parse_session(&text, now_unix())?;
        self.save_session(&session)?;
        self.changes.emit(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl IdentityProvider for GoTrueClient {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.stored_session() else {
            return Ok(None);
        };
        if !self.config.auto_refresh || !session.expires_within(now_unix(), EXPIRY_MARGIN_SECS) {
            return Ok(Some(session));
        }

        tracing::debug!("stored session near expiry; refreshing");
        match self.refresh_session(&session.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) => {
                if !e.retryable() {
                    self.clear_session();
                    self.changes.emit(AuthEvent::SignedOut, None);
                }
                Err(e)
            }
        }
    }

    async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        let text = self
            .send::<()>(Method::GET, "/user", &[], None, Some(&session.access_token))
            .await?;
        parse_identity(&text).map(Some)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<&SignUpMetadata>,
        redirect_to: &str,
    ) -> Result<AuthResponse, AuthError> {
        let code_challenge = self.begin_pkce(AuthEvent::SignedIn);
        let body = SignUpBody {
            email,
            password,
            data: metadata,
            code_challenge: &code_challenge,
            code_challenge_method: pkce::CHALLENGE_METHOD,
        };
        let text = self
            .send(Method::POST, "/signup", &[("redirect_to", redirect_to)], Some(&body), None)
            .await?;

        match parse_sign_up(&text, now_unix())? {
            SignUpOutcome::Session(session) => self.commit_session(session, AuthEvent::SignedIn),
            SignUpOutcome::PendingConfirmation(user) => Ok(AuthResponse { user: Some(user), session: None }),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let body = PasswordBody { email, password };
        let text = self
            .send(Method::POST, "/token", &[("grant_type", "password")], Some(&body), None)
            .await?;
        let session = parse_session(&text, now_unix())?;
        self.commit_session(session, AuthEvent::SignedIn)
    }

    async fn sign_in_with_otp(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let code_challenge = self.begin_pkce(AuthEvent::SignedIn);
        let body = OtpBody {
            email,
            create_user: true,
            code_challenge: &code_challenge,
            code_challenge_method: pkce::CHALLENGE_METHOD,
        };
        self.send(Method::POST, "/otp", &[("redirect_to", redirect_to)], Some(&body), None)
            .await?;
        Ok(())
    }

    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, AuthError> {
        let endpoint = self.endpoint("/authorize")?;
        let code_challenge = self.begin_pkce(AuthEvent::SignedIn);
        let url = authorize_url(&endpoint, provider, redirect_to, &code_challenge)?;
        Ok(OAuthRedirect { provider, url })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let outcome = match self.stored_session() {
            Some(session) => self
                .send::<()>(Method::POST, "/logout", &[("scope", "global")], None, Some(&session.access_token))
                .await
                .map(|_| ()),
            None => Ok(()),
        };

        // The local session is dropped even when the provider already
        // considers the token invalid.
        self.clear_session();
        self.storage.remove_item(CODE_VERIFIER_KEY);
        self.changes.emit(AuthEvent::SignedOut, None);

        match outcome {
            Err(AuthError::Api { status: 401 | 403 | 404, .. }) => Ok(()),
            other => other,
        }
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let code_challenge = self.begin_pkce(AuthEvent::PasswordRecovery);
        let body = RecoverBody {
            email,
            code_challenge: &code_challenge,
            code_challenge_method: pkce::CHALLENGE_METHOD,
        };
        self.send(Method::POST, "/recover", &[("redirect_to", redirect_to)], Some(&body), None)
            .await?;
        Ok(())
    }

    async fn update_user_password(&self, password: &str) -> Result<Identity, AuthError> {
        let mut session = self.get_session().await?.ok_or(AuthError::MissingSession)?;
        let body = UpdateUserBody { password };
        let text = self
            .send(Method::PUT, "/user", &[], Some(&body), Some(&session.access_token))
            .await?;
        let user = parse_identity(&text)?;

        session.user = user.clone();
        self.save_session(&session)?;
        self.changes.emit(AuthEvent::UserUpdated, Some(session));
        Ok(user)
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<AuthResponse, AuthError> {
        let stored = self
            .storage
            .get_item(CODE_VERIFIER_KEY)
            .ok_or(AuthError::MissingCodeVerifier)?;
        let (verifier, event) = split_stored_verifier(&stored);
        let body = PkceBody { auth_code: code, code_verifier: verifier };
        let text = self
            .send(Method::POST, "/token", &[("grant_type", "pkce")], Some(&body), None)
            .await?;
        self.storage.remove_item(CODE_VERIFIER_KEY);

        let session = parse_session(&text, now_unix())?;
        self.commit_session(session, event)
    }

    fn on_auth_state_change(&self) -> ChangeFeed {
        self.changes.subscribe()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct PasswordBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct PkceBody<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a SignUpMetadata>,
    code_challenge: &'a str,
    code_challenge_method: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    create_user: bool,
    code_challenge: &'a str,
    code_challenge_method: &'a str,
}

#[derive(Serialize)]
struct RecoverBody<'a> {
    email: &'a str,
    code_challenge: &'a str,
    code_challenge_method: &'a str,
}

#[derive(Serialize)]
struct UpdateUserBody<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, PartialEq)]
enum SignUpOutcome {
    /// Auto-confirmed: the provider issued tokens immediately.
    Session(Session),
    /// Email confirmation required before a session exists.
    PendingConfirmation(Identity),
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_session(json: &str, now: i64) -> Result<Session, AuthError> {
    let token: TokenResponse = serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))?;
    let expires_at = token
        .expires_at
        .unwrap_or_else(|| now + token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_type: token.token_type.unwrap_or_else(|| "bearer".to_owned()),
        expires_at,
        user: token.user,
    })
}

fn parse_identity(json: &str) -> Result<Identity, AuthError> {
    serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))
}

fn parse_sign_up(json: &str, now: i64) -> Result<SignUpOutcome, AuthError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| AuthError::Parse(e.to_string()))?;
    if value.get("access_token").is_some() {
        return parse_session(json, now).map(SignUpOutcome::Session);
    }
    // Older GoTrue versions wrap the user; newer ones return it bare.
    let user = value.get("user").cloned().unwrap_or(value);
    serde_json::from_value(user)
        .map(SignUpOutcome::PendingConfirmation)
        .map_err(|e| AuthError::Parse(e.to_string()))
}

fn parse_error(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.error_description).or(b.message).or(b.error))
        .unwrap_or_else(|| body.trim().to_owned());
    AuthError::Api { status, message }
}

fn authorize_url(
    endpoint: &str,
    provider: OAuthProvider,
    redirect_to: &str,
    code_challenge: &str,
) -> Result<String, AuthError> {
    let url = url::Url::parse_with_params(
        endpoint,
        &[
            ("provider", provider.as_str()),
            ("redirect_to", redirect_to),
            ("code_challenge", code_challenge),
            ("code_challenge_method", pkce::CHALLENGE_METHOD),
        ],
    )
    .map_err(|e| AuthError::Parse(e.to_string()))?;
    Ok(url.into())
}

/// Split a stored verifier into the wire verifier and the event its
/// exchange publishes.
fn split_stored_verifier(stored: &str) -> (&str, AuthEvent) {
    match stored.strip_suffix(RECOVERY_MARKER) {
        Some(verifier) => (verifier, AuthEvent::PasswordRecovery),
        None => (stored, AuthEvent::SignedIn),
    }
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
