//! Identity-provider seam and change-feed plumbing.
//!
//! ARCHITECTURE
//! ============
//! `SessionStore` talks to the hosted identity service only through
//! [`IdentityProvider`]. Production uses `GoTrueClient`; tests substitute an
//! in-memory mock. Providers publish every session mutation on a broadcast
//! channel so the store can react without polling.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::types::{AuthChange, AuthEvent, AuthResponse, Identity, OAuthProvider, OAuthRedirect, Session, SignUpMetadata};

const CHANGE_FEED_CAPACITY: usize = 32;

/// Operations the session core consumes from the identity service.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait IdentityProvider: Send + Sync {
    /// Current persisted session, refreshed first when near expiry.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Identity for the current session, fetched from the provider.
    async fn get_user(&self) -> Result<Option<Identity>, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Option<&SignUpMetadata>,
        redirect_to: &str,
    ) -> Result<AuthResponse, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Email a one-time sign-in link.
    async fn sign_in_with_otp(&self, email: &str, redirect_to: &str) -> Result<(), AuthError>;

    /// Prepare a third-party authorization URL; the caller performs the redirect.
    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<OAuthRedirect, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), AuthError>;

    async fn update_user_password(&self, password: &str) -> Result<Identity, AuthError>;

    /// Trade a one-time callback code for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<AuthResponse, AuthError>;

    /// Subscribe to session-affecting events. Dropping the feed unsubscribes.
    fn on_auth_state_change(&self) -> ChangeFeed;
}

/// Publishing half of the change feed, owned by a provider.
#[derive(Clone, Debug)]
pub struct ChangeEmitter {
    tx: broadcast::Sender<AuthChange>,
}

impl ChangeEmitter {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Having no listeners is not an error.
    pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
        tracing::debug!(%event, has_session = session.is_some(), "auth change emitted");
        let _ = self.tx.send(AuthChange { event, session });
    }

    #[must_use]
    pub fn subscribe(&self) -> ChangeFeed {
        ChangeFeed { rx: self.tx.subscribe() }
    }
}

impl Default for ChangeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of the change feed.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: broadcast::Receiver<AuthChange>,
}

impl ChangeFeed {
    /// Next change, or `None` once the provider is gone.
    ///
    /// A lagging listener skips the overwritten events; the next one it sees
    /// still carries the latest session.
    pub async fn next(&mut self) -> Option<AuthChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth change feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
