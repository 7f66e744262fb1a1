//! Route admission.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation is checked against the route's declared policy and the
//! session store's current snapshot. The decision is a pure function so the
//! UI can re-evaluate it on every auth change without side effects; the UI is
//! responsible for performing any redirect it returns.
//!
//! These guards shape the user experience only. The data service still
//! enforces access on every request.

use url::{Url, form_urlencoded};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub use crate::config::{CALLBACK_PATH, RESET_PASSWORD_PATH};

// =============================================================================
// POLICY
// =============================================================================

/// Per-route authentication requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Signed-in users only (dashboard and everything behind it).
    RequiresAuthenticated,
    /// Signed-out users only (login, registration).
    RequiresAnonymous,
    /// Anyone; the guard never redirects.
    Public,
}

/// A route declaration: path plus admission policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub path: &'static str,
    pub policy: AdmissionPolicy,
}

/// Every route the app serves.
pub const ROUTES: &[RouteRule] = &[
    RouteRule { path: HOME_PATH, policy: AdmissionPolicy::Public },
    RouteRule { path: LOGIN_PATH, policy: AdmissionPolicy::RequiresAnonymous },
    RouteRule { path: REGISTER_PATH, policy: AdmissionPolicy::RequiresAnonymous },
    RouteRule { path: FORGOT_PASSWORD_PATH, policy: AdmissionPolicy::RequiresAnonymous },
    RouteRule { path: RESET_PASSWORD_PATH, policy: AdmissionPolicy::Public },
    RouteRule { path: DASHBOARD_PATH, policy: AdmissionPolicy::RequiresAuthenticated },
    RouteRule { path: CALLBACK_PATH, policy: AdmissionPolicy::Public },
];

/// Policy for a request path; unknown paths are public (they render 404).
#[must_use]
pub fn policy_for(path: &str) -> AdmissionPolicy {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    ROUTES
        .iter()
        .find(|route| route.path == path)
        .map_or(AdmissionPolicy::Public, |route| route.policy)
}

// =============================================================================
// DECISION
// =============================================================================

/// What the guard needs to know about auth state.
pub trait AuthView {
    fn is_loading(&self) -> bool;
    fn is_authenticated(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state not resolved yet; show a neutral loading indicator.
    Loading,
    /// Replace the current location with this one.
    Redirect(Navigation),
    /// Render the requested view unchanged.
    Render,
}

/// Decide admission for `requested` (path plus optional query).
///
/// `loading` short-circuits both checks so a signed-in user never sees a
/// flash redirect to login while the initial session fetch is in flight.
/// A signed-in user on an anonymous-only page goes to the page's `redirect`
/// parameter when it is a safe local path, else to the dashboard.
#[must_use]
pub fn evaluate<V: AuthView + ?Sized>(policy: AdmissionPolicy, auth: &V, requested: &str) -> GuardDecision {
    if auth.is_loading() {
        return GuardDecision::Loading;
    }
    match policy {
        AdmissionPolicy::RequiresAuthenticated if !auth.is_authenticated() => {
            GuardDecision::Redirect(Navigation::to(LOGIN_PATH).with_redirect(requested))
        }
        AdmissionPolicy::RequiresAnonymous if auth.is_authenticated() => {
            let query = requested.split_once('?').map_or("", |(_, query)| query);
            let target = LoginContext::from_query(query).redirect_target().to_owned();
            GuardDecision::Redirect(Navigation::to(target))
        }
        _ => GuardDecision::Render,
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Client-side navigation target with optional context for the next page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    /// Location to return to after logging in.
    pub redirect: Option<String>,
    /// Error text for the destination to display.
    pub error: Option<String>,
    /// Informational text for the destination to display.
    pub message: Option<String>,
}

impl Navigation {
    #[must_use]
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Path with context encoded as query parameters.
    #[must_use]
    pub fn href(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in [("redirect", &self.redirect), ("error", &self.error), ("message", &self.message)] {
            if let Some(value) = value {
                query.append_pair(key, value);
                any = true;
            }
        }
        if any { format!("{}?{}", self.path, query.finish()) } else { self.path.clone() }
    }
}

/// Context the login page receives from redirects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginContext {
    pub redirect: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl LoginContext {
    /// Parse from a query string, with or without the leading `?`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut context = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "redirect" => context.redirect = Some(value.to_owned()),
                "error" => context.error = Some(value.to_owned()),
                "message" => context.message = Some(value.to_owned()),
                _ => {}
            }
        }
        context
    }

    /// Where to go after a successful sign-in.
    ///
    /// Only same-origin absolute paths are honored; anything else (external
    /// URLs, protocol-relative `//host`, the login page itself) falls back to
    /// the dashboard.
    #[must_use]
    pub fn redirect_target(&self) -> &str {
        match self.redirect.as_deref() {
            Some(target) if is_local_path(target) && policy_for(target) != AdmissionPolicy::RequiresAnonymous => target,
            _ => DASHBOARD_PATH,
        }
    }
}

/// Origin used only to resolve candidate redirect targets.
const RESOLVE_ORIGIN: &str = "http://coursehub.invalid/";

/// True when `target` resolves to a path on the current origin.
///
/// Browsers strip tab, CR and LF before resolving, and treat `\` like `/`,
/// so any whitespace, control character or backslash is rejected outright
/// before the target is resolved against a fixed origin.
fn is_local_path(target: &str) -> bool {
    if !target.starts_with('/') || target.chars().any(|c| c.is_control() || c.is_whitespace() || c == '\\') {
        return false;
    }
    let Ok(base) = Url::parse(RESOLVE_ORIGIN) else {
        return false;
    };
    base.join(target).is_ok_and(|resolved| resolved.origin() == base.origin())
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
