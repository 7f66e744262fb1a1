//! Return leg of email-confirmation, magic-link and OAuth flows.
//!
//! The identity service redirects back to `/auth/callback` with either a
//! one-time `code` or an `error_description`. Resolution exchanges the code
//! through the store, then waits for the store to settle before deciding
//! where the user lands. Waiting is driven by snapshot changes, never by a
//! fixed delay.

use url::{Url, form_urlencoded};

use crate::guard::{DASHBOARD_PATH, LOGIN_PATH, Navigation};
use crate::store::{AuthSnapshot, SessionStore};

/// Shown on the login page when the flow completed without a session,
/// e.g. after confirming an email address.
pub const CONFIRMED_MESSAGE: &str = "Authentication successful! You can now log in.";

/// Query and fragment parameters the identity service may return.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse a query (or fragment) string, with or without its `?`/`#`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        params.merge(query);
        params
    }

    /// Parse both the query and the fragment of a full callback URL.
    ///
    /// Implicit-grant errors arrive in the fragment; the query wins when a
    /// key appears in both.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let Ok(url) = Url::parse(url) else {
            return Self::default();
        };
        let mut params = Self::default();
        params.merge(url.query().unwrap_or_default());
        params.merge(url.fragment().unwrap_or_default());
        params
    }

    fn merge(&mut self, raw: &str) {
        let raw = raw.trim_start_matches(['?', '#']);
        let mut error_code = None;
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "code" if self.code.is_none() => self.code = Some(value.to_owned()),
                "error_description" if self.error_description.is_none() => {
                    self.error_description = Some(value.to_owned());
                }
                "error" => error_code = Some(value.to_owned()),
                _ => {}
            }
        }
        if self.error_description.is_none() {
            self.error_description = error_code;
        }
    }
}

/// First step of resolution, decided from the parameters alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackStart {
    /// The service reported an error; go straight to login.
    Fail(Navigation),
    /// Exchange this code, then wait for the store.
    Exchange(String),
    /// Nothing to exchange; wait for the store.
    Wait,
}

#[must_use]
pub fn start(params: &CallbackParams) -> CallbackStart {
    if let Some(description) = &params.error_description {
        return CallbackStart::Fail(Navigation::to(LOGIN_PATH).with_error(description.clone()));
    }
    match &params.code {
        Some(code) => CallbackStart::Exchange(code.clone()),
        None => CallbackStart::Wait,
    }
}

/// Final destination once `snapshot` has settled, or `None` to keep waiting.
///
/// `newer_than` is the store's issued revision captured before a successful
/// exchange; the snapshot must come from a later resolution so the decision
/// reflects the exchanged session.
#[must_use]
pub fn settle(snapshot: &AuthSnapshot, newer_than: Option<u64>) -> Option<Navigation> {
    if snapshot.loading || newer_than.is_some_and(|floor| snapshot.revision <= floor) {
        return None;
    }
    Some(if snapshot.user.is_some() {
        Navigation::to(DASHBOARD_PATH)
    } else {
        Navigation::to(LOGIN_PATH).with_message(CONFIRMED_MESSAGE)
    })
}

/// Run the callback flow to completion and return where to navigate.
pub async fn resolve_callback(store: &SessionStore, params: CallbackParams) -> Navigation {
    let mut newer_than = None;
    match start(&params) {
        CallbackStart::Fail(navigation) => {
            tracing::warn!(error = ?params.error_description, "auth callback returned an error");
            return navigation;
        }
        CallbackStart::Exchange(code) => {
            let before = store.issued_revision();
            match store.exchange_code_for_session(&code).await {
                Ok(_) => newer_than = Some(before),
                Err(e) => tracing::error!(error = %e, "failed to exchange callback code"),
            }
        }
        CallbackStart::Wait => {}
    }

    let mut rx = store.subscribe();
    let settled = rx
        .wait_for(|snapshot| settle(snapshot, newer_than).is_some())
        .await
        .ok()
        .and_then(|snapshot| settle(&snapshot, newer_than));
    settled.unwrap_or_else(|| Navigation::to(LOGIN_PATH).with_message(CONFIRMED_MESSAGE))
}

#[cfg(test)]
#[path = "callback_test.rs"]
mod tests;
