//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! host holds no sessions of its own; it only knows how to point browsers at
//! the identity service.

use std::sync::Arc;

use auth::AuthConfig;

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth: Arc::new(auth) }
    }
}
