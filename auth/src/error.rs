//! Auth error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Provider calls return these errors instead of panicking. Forms render
//! `user_message()` inline; the session store logs them and falls back to
//! "no session".

/// Errors produced by identity-provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `SUPABASE_URL` or `SUPABASE_ANON_KEY` was not provided.
    #[error("identity provider is not configured")]
    NotConfigured,

    /// The HTTP request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The provider response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The operation needs a signed-in session and there is none.
    #[error("no active session")]
    MissingSession,

    /// A PKCE code exchange was attempted without a stored verifier.
    #[error("no code verifier stored for this browser")]
    MissingCodeVerifier,

    /// An OAuth provider name outside the supported set.
    #[error("unsupported oauth provider: {0}")]
    UnknownProvider(String),

    /// Persisted session state could not be read or written.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// Text suitable for inline display next to an auth form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::Api { status: 429, .. } => "Too many attempts. Please wait a moment and try again.".to_owned(),
            Self::Request(_) => "Could not reach the authentication service. Please try again.".to_owned(),
            Self::NotConfigured => "Authentication is not configured for this site.".to_owned(),
            Self::MissingSession => "Your session has expired. Please log in again.".to_owned(),
            Self::MissingCodeVerifier => {
                "This sign-in link was opened in a different browser. Please request a new one.".to_owned()
            }
            Self::UnknownProvider(name) => format!("Sign-in with {name} is not supported."),
            Self::Api { .. } | Self::Parse(_) | Self::Storage(_) => {
                "An unexpected error occurred. Please try again.".to_owned()
            }
        }
    }

    /// Whether repeating the same call could succeed without user action.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
