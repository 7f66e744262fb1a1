//! Process-wide session store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The single source of truth for `{ session, user, loading }`. Route guards,
//! pages and the callback resolver read immutable [`AuthSnapshot`]s from it;
//! nothing else asks the identity provider for session state directly.
//!
//! ORDERING
//! ========
//! State is written from two places: the initial load and the change-feed
//! listener. Each session→identity resolution takes a sequence number before
//! its first await, and a resolution only commits if its number is still the
//! latest issued. A slow initial fetch that settles after a newer change-feed
//! event is therefore discarded instead of overwriting fresher state.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{oneshot, watch};

use crate::config::{CALLBACK_PATH, RESET_PASSWORD_PATH};
use crate::error::AuthError;
use crate::guard::AuthView;
use crate::provider::{ChangeFeed, IdentityProvider};
use crate::runtime;
use crate::types::{AuthResponse, Identity, OAuthProvider, OAuthRedirect, Session, SignUpMetadata};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable view of the store at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub user: Option<Identity>,
    /// True until the first resolution settles.
    pub loading: bool,
    /// Sequence number of the resolution that produced this snapshot.
    pub revision: u64,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self { session: None, user: None, loading: true, revision: 0 }
    }
}

impl AuthView for AuthSnapshot {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    site_url: String,
    state: watch::Sender<AuthSnapshot>,
    issued: AtomicU64,
}

impl SessionStore {
    /// `site_url` is the origin that email and OAuth flows return to.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, site_url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            provider,
            site_url: site_url.into().trim_end_matches('/').to_owned(),
            state,
            issued: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified after every committed resolution.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Highest sequence number handed out so far.
    #[must_use]
    pub fn issued_revision(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Load the current session and start following the change feed.
    ///
    /// Resolution failures are logged and leave the store signed out; the
    /// store always ends with `loading == false`. The listener runs until the
    /// returned [`Subscription`] is dropped.
    pub async fn initialize(self: &Arc<Self>) -> Subscription {
        self.state.send_modify(|s| s.loading = true);

        let feed = self.provider.on_auth_state_change();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        runtime::spawn(Arc::clone(self).listen(feed, cancel_rx));

        let seq = self.next_seq();
        let session = match self.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "failed to load current session");
                None
            }
        };
        self.resolve(seq, session).await;

        Subscription { cancel: Some(cancel_tx) }
    }

    async fn listen(self: Arc<Self>, mut feed: ChangeFeed, mut cancel: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => break,
                change = feed.next() => {
                    let Some(change) = change else { break };
                    tracing::info!(event = %change.event, has_session = change.session.is_some(), "auth state changed");
                    let seq = self.next_seq();
                    self.resolve(seq, change.session).await;
                }
            }
        }
        tracing::debug!("auth change listener stopped");
    }

    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Resolve identity for `session` and commit if `seq` is still current.
    async fn resolve(&self, seq: u64, session: Option<Session>) {
        let user = match session {
            Some(_) => match self.provider.get_user().await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to resolve user for session");
                    None
                }
            },
            None => None,
        };
        self.commit(seq, session, user);
    }

    fn commit(&self, seq: u64, session: Option<Session>, user: Option<Identity>) -> bool {
        let user = if session.is_some() { user } else { None };
        let committed = self.state.send_if_modified(|current| {
            if seq != self.issued.load(Ordering::SeqCst) || seq <= current.revision {
                return false;
            }
            *current = AuthSnapshot { session, user, loading: false, revision: seq };
            true
        });
        if !committed {
            tracing::debug!(seq, latest = self.issued_revision(), "discarded stale session resolution");
        }
        committed
    }

    fn callback_url(&self) -> String {
        format!("{}{CALLBACK_PATH}", self.site_url)
    }

    // -------------------------------------------------------------------------
    // dispatch
    // -------------------------------------------------------------------------
    //
    // None of these mutate the snapshot directly; the provider's change feed
    // drives every state transition.

    /// Register a new account; confirmation returns via `/auth/callback`.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<SignUpMetadata>,
    ) -> Result<AuthResponse, AuthError> {
        tracing::info!(email, "signing up");
        self.provider
            .sign_up(email, password, metadata.as_ref(), &self.callback_url())
            .await
    }

    /// Password sign-in.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged (e.g. invalid credentials).
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        tracing::info!(email, "signing in with password");
        let result = self.provider.sign_in_with_password(email, password).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "password sign-in failed");
        }
        result
    }

    /// Email a magic link that returns via `/auth/callback`.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn sign_in_with_otp(&self, email: &str) -> Result<(), AuthError> {
        tracing::info!(email, "requesting magic link");
        self.provider.sign_in_with_otp(email, &self.callback_url()).await
    }

    /// Authorization URL for a third-party sign-in. The caller navigates.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> Result<OAuthRedirect, AuthError> {
        tracing::info!(%provider, "starting oauth sign-in");
        self.provider
            .sign_in_with_oauth(provider, &self.callback_url())
            .await
    }

    /// Sign out. Callers navigate after this resolves.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged; the local session is cleared
    /// regardless.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        tracing::info!("signing out");
        self.provider.sign_out().await
    }

    /// Send a password-recovery email linking to `/reset-password`.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let redirect_to = format!("{}{RESET_PASSWORD_PATH}", self.site_url);
        self.provider.reset_password_for_email(email, &redirect_to).await
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSession` when signed out, otherwise the
    /// provider error unchanged.
    pub async fn update_password(&self, password: &str) -> Result<Identity, AuthError> {
        self.provider.update_user_password(password).await
    }

    /// Trade a callback `code` for a session.
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<AuthResponse, AuthError> {
        self.provider.exchange_code_for_session(code).await
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Keeps the change-feed listener alive; dropping it stops the listener.
#[derive(Debug)]
pub struct Subscription {
    cancel: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_listener();
    }

    fn cancel_listener(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_listener();
    }
}

/// Hand the current snapshot and every later commit to `apply`.
///
/// Returns when `apply` breaks or the store behind `rx` is dropped. The
/// receiver does not keep the store alive.
pub async fn follow(mut rx: watch::Receiver<AuthSnapshot>, mut apply: impl FnMut(&AuthSnapshot) -> ControlFlow<()>) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if apply(&snapshot).is_break() || rx.changed().await.is_err() {
            break;
        }
    }
    tracing::debug!("stopped following session store");
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
