//! Session, identity and change-feed types.
//!
//! DESIGN
//! ======
//! Field names follow the GoTrue JSON payloads so the provider client can
//! deserialize responses directly and persist sessions without a mapping
//! layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

// =============================================================================
// SESSION
// =============================================================================

/// Token bundle issued by the identity provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expiry as unix seconds.
    pub expires_at: i64,
    /// User record returned alongside the tokens.
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl Session {
    /// True when the access token expires within `margin_secs` of `now`.
    #[must_use]
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at - now <= margin_secs
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Resolved user profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: String,
    /// Database role marker (e.g. `"authenticated"`).
    #[serde(default)]
    pub role: Option<String>,
    /// Free-form profile data set at sign-up.
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Display name from `user_metadata.full_name`, when set and non-blank.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Name used in greetings: display name, falling back to email.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name().unwrap_or(&self.email)
    }
}

/// Optional profile data attached to a registration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Result of a sign-up / sign-in / code exchange.
///
/// `session` is `None` when the provider still requires email confirmation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthResponse {
    pub user: Option<Identity>,
    pub session: Option<Session>,
}

// =============================================================================
// CHANGE FEED
// =============================================================================

/// Session-affecting event kinds published on the change feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl AuthEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change-feed notification: the event and the session after it.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

// =============================================================================
// OAUTH
// =============================================================================

/// Third-party identity providers accepted by `sign_in_with_oauth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
    Gitlab,
    Bitbucket,
    Azure,
    Twitter,
    Apple,
    Slack,
    Spotify,
    Discord,
    Twitch,
    Linkedin,
    Workos,
    Notion,
    Keycloak,
}

impl OAuthProvider {
    pub const ALL: [Self; 15] = [
        Self::Google,
        Self::Github,
        Self::Gitlab,
        Self::Bitbucket,
        Self::Azure,
        Self::Twitter,
        Self::Apple,
        Self::Slack,
        Self::Spotify,
        Self::Discord,
        Self::Twitch,
        Self::Linkedin,
        Self::Workos,
        Self::Notion,
        Self::Keycloak,
    ];

    /// Provider identifier as used in the `/authorize` query.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::Azure => "azure",
            Self::Twitter => "twitter",
            Self::Apple => "apple",
            Self::Slack => "slack",
            Self::Spotify => "spotify",
            Self::Discord => "discord",
            Self::Twitch => "twitch",
            Self::Linkedin => "linkedin",
            Self::Workos => "workos",
            Self::Notion => "notion",
            Self::Keycloak => "keycloak",
        }
    }

    /// Human-readable name for sign-in buttons.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
            Self::Gitlab => "GitLab",
            Self::Bitbucket => "Bitbucket",
            Self::Azure => "Azure",
            Self::Twitter => "Twitter",
            Self::Apple => "Apple",
            Self::Slack => "Slack",
            Self::Spotify => "Spotify",
            Self::Discord => "Discord",
            Self::Twitch => "Twitch",
            Self::Linkedin => "LinkedIn",
            Self::Workos => "WorkOS",
            Self::Notion => "Notion",
            Self::Keycloak => "Keycloak",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == wanted)
            .ok_or_else(|| AuthError::UnknownProvider(raw.trim().to_owned()))
    }
}

/// Authorization URL the browser must be sent to for an OAuth sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub provider: OAuthProvider,
    pub url: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
