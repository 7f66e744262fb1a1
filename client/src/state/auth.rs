//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthState` is the signal-side mirror of `auth::AuthSnapshot`. The app
//! shell writes it on every committed store change; route guards and pages
//! only read it. Dispatch goes through `AuthHandle`, never through the signal.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use auth::{AuthError, AuthSnapshot, AuthView, Identity, SessionStore};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub loading: bool,
}

impl Default for AuthState {
    /// Starts loading so guards hold their decision until the store settles.
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl From<&AuthSnapshot> for AuthState {
    fn from(snapshot: &AuthSnapshot) -> Self {
        Self { user: snapshot.user.clone(), loading: snapshot.loading }
    }
}

impl AuthView for AuthState {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Access to the session store, absent during SSR and until config loads.
#[derive(Clone, Default)]
pub struct AuthHandle {
    pub store: Option<Arc<SessionStore>>,
}

impl AuthHandle {
    /// The store, or `NotConfigured` when it has not been created.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` when no store is available.
    pub fn store(&self) -> Result<Arc<SessionStore>, AuthError> {
        self.store.clone().ok_or(AuthError::NotConfigured)
    }
}
