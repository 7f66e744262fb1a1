//! Browser bootstrap and liveness endpoints.
//!
//! The browser talks to the identity service directly; the host only hands
//! out the public project URL and anon key. An unconfigured host still
//! answers with empty values so the UI loads and reports the problem per
//! call instead of failing to hydrate.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use auth::ClientConfig;
use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::state::AppState;

/// `GET /api/config` — public identity-service settings.
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    if !state.auth.is_configured() {
        tracing::warn!("serving client config without identity service credentials");
    }
    Json(state.auth.client_config())
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    pub status: &'static str,
    pub auth_configured: bool,
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Json<Health> {
    Json(Health { status: "ok", auth_configured: state.auth.is_configured() })
}
