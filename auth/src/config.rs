//! Identity-provider configuration parsed from environment variables.
//!
//! Missing credentials are logged, not fatal: every provider call then fails
//! with `AuthError::NotConfigured` instead.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const CALLBACK_PATH: &str = "/auth/callback";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_AUTH_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_AUTH_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`. No trailing slash.
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: String,
    /// Origin the app is served from; callback URLs hang off it.
    pub site_url: String,
    /// Refresh near-expiry sessions when they are read.
    pub auto_refresh: bool,
    pub timeouts: AuthTimeouts,
}

impl AuthConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            url: trim_base(url.into()),
            anon_key: anon_key.into().trim().to_owned(),
            site_url: trim_base(site_url.into()),
            auto_refresh: true,
            timeouts: AuthTimeouts::default(),
        }
    }

    /// Build config from environment variables.
    ///
    /// Required (logged when absent):
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `SITE_URL`: default `http://localhost:3000`
    /// - `AUTH_AUTO_REFRESH`: default true
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL").unwrap_or_default();
        let anon_key = lookup("SUPABASE_ANON_KEY").unwrap_or_default();
        let site_url = lookup("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_owned());

        let mut config = Self::new(url, anon_key, site_url);
        config.auto_refresh = lookup("AUTH_AUTO_REFRESH")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(true);
        config.timeouts = AuthTimeouts {
            request_secs: parse_u64(lookup("AUTH_REQUEST_TIMEOUT_SECS"), DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("AUTH_CONNECT_TIMEOUT_SECS"), DEFAULT_AUTH_CONNECT_TIMEOUT_SECS),
        };

        tracing::info!(
            has_url = !config.url.is_empty(),
            has_key = !config.anon_key.is_empty(),
            "identity provider connection info"
        );
        if !config.is_configured() {
            tracing::error!("identity provider credentials are missing; set SUPABASE_URL and SUPABASE_ANON_KEY");
        }
        config
    }

    /// Rebuild a full config from the public subset handed to browsers.
    #[must_use]
    pub fn from_client_config(client: ClientConfig) -> Self {
        let mut config = Self::new(client.url, client.anon_key, client.site_url);
        config.auto_refresh = client.auto_refresh;
        config
    }

    /// The public subset safe to expose to browsers.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            anon_key: self.anon_key.clone(),
            site_url: self.site_url.clone(),
            auto_refresh: self.auto_refresh,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }
}

/// Browser-facing config served by the host at `/api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    pub anon_key: String,
    pub site_url: String,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
}

fn default_true() -> bool {
    true
}

fn trim_base(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
