//! In-memory identity provider for store and callback tests.

use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::AuthError;
use crate::provider::{ChangeEmitter, ChangeFeed, IdentityProvider};
use crate::types::{AuthEvent, AuthResponse, Identity, OAuthProvider, OAuthRedirect, Session, SignUpMetadata};

pub(crate) const GOOD_PASSWORD: &str = "password123";
pub(crate) const GOOD_CODE: &str = "good-code";

pub(crate) fn identity(email: &str) -> Identity {
    Identity {
        id: format!("id-{email}"),
        email: email.to_owned(),
        role: Some("authenticated".to_owned()),
        user_metadata: serde_json::Map::new(),
    }
}

pub(crate) fn session(email: &str) -> Session {
    Session {
        access_token: format!("access-{email}"),
        refresh_token: "refresh".to_owned(),
        token_type: "bearer".to_owned(),
        expires_at: i64::MAX / 2,
        user: identity(email),
    }
}

#[derive(Default)]
pub(crate) struct MockProvider {
    pub changes: ChangeEmitter,
    session: Mutex<Option<Session>>,
    session_error: Mutex<Option<AuthError>>,
    user_error: Mutex<Option<AuthError>>,
    session_gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn with_session(email: &str) -> Self {
        let mock = Self::default();
        *mock.session.lock().unwrap() = Some(session(email));
        mock
    }

    pub fn fail_get_session(&self, err: AuthError) {
        *self.session_error.lock().unwrap() = Some(err);
    }

    pub fn fail_get_user(&self, err: AuthError) {
        *self.user_error.lock().unwrap() = Some(err);
    }

    /// Hold `get_session` until the returned sender fires.
    pub fn gate_get_session(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.session_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap() = session;
    }

    /// Act like a completed recovery-link exchange for `email`.
    pub fn recover(&self, email: &str) {
        let recovered = session(email);
        *self.session.lock().unwrap() = Some(recovered.clone());
        self.changes.emit(AuthEvent::PasswordRecovery, Some(recovered));
    }

    fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.record("get_session".into());
        let gate = self.session_gate.lock().unwrap().take();
        // Snapshot before waiting so a gated read returns pre-gate state.
        let session = self.current_session();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.session_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(session)
    }

    async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        self.record("get_user".into());
        if let Some(err) = self.user_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.current_session().map(|s| s.user))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: Option<&SignUpMetadata>,
        redirect_to: &str,
    ) -> Result<AuthResponse, AuthError> {
        self.record(format!("sign_up:{email}:{redirect_to}"));
        let mut user = identity(email);
        if let Some(name) = metadata.and_then(|m| m.full_name.clone()) {
            user.user_metadata.insert("full_name".into(), name.into());
        }
        Ok(AuthResponse { user: Some(user), session: None })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.record(format!("sign_in:{email}"));
        if password != GOOD_PASSWORD {
            return Err(AuthError::Api { status: 400, message: "Invalid login credentials".into() });
        }
        let session = session(email);
        self.set_session(Some(session.clone()));
        self.changes.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(AuthResponse { user: Some(session.user.clone()), session: Some(session) })
    }

    async fn sign_in_with_otp(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        self.record(format!("otp:{email}:{redirect_to}"));
        Ok(())
    }

    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, AuthError> {
        self.record(format!("oauth:{provider}:{redirect_to}"));
        Ok(OAuthRedirect { provider, url: format!("https://idp.test/authorize?provider={provider}") })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record("sign_out".into());
        self.set_session(None);
        self.changes.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        self.record(format!("recover:{email}:{redirect_to}"));
        Ok(())
    }

    async fn update_user_password(&self, _password: &str) -> Result<Identity, AuthError> {
        self.record("update_password".into());
        let session = self.current_session().ok_or(AuthError::MissingSession)?;
        self.changes.emit(AuthEvent::UserUpdated, Some(session.clone()));
        Ok(session.user)
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<AuthResponse, AuthError> {
        self.record(format!("exchange:{code}"));
        if code != GOOD_CODE {
            return Err(AuthError::Api { status: 400, message: "invalid flow state".into() });
        }
        let session = session("oauth@example.com");
        self.set_session(Some(session.clone()));
        self.changes.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(AuthResponse { user: Some(session.user.clone()), session: Some(session) })
    }

    fn on_auth_state_change(&self) -> ChangeFeed {
        self.changes.subscribe()
    }
}
