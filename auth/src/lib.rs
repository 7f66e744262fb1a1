//! # auth
//!
//! Session and route-admission core for the CourseHub web app.
//!
//! SYSTEM CONTEXT
//! ==============
//! Identity, sessions and token refresh live in a hosted GoTrue service. This
//! crate owns the client side of that relationship: a single `SessionStore`
//! that mirrors the provider's session into immutable snapshots, a pure route
//! guard that turns a snapshot into an admission decision, and the callback
//! resolver that finishes email-confirmation, magic-link and OAuth flows.
//!
//! The crate is runtime-agnostic: it spawns its change-feed listener on tokio
//! natively and on the browser event loop under `wasm32`.

pub mod callback;
pub mod config;
pub mod error;
pub mod gotrue;
pub mod guard;
pub mod pkce;
pub mod provider;
pub mod storage;
pub mod store;
pub mod types;

mod runtime;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use callback::{CallbackParams, resolve_callback};
pub use config::{AuthConfig, ClientConfig};
pub use error::AuthError;
pub use gotrue::GoTrueClient;
pub use guard::{AdmissionPolicy, AuthView, GuardDecision, LoginContext, Navigation, evaluate};
pub use provider::{ChangeEmitter, ChangeFeed, IdentityProvider};
pub use storage::{MemoryStorage, SessionStorage};
pub use store::{AuthSnapshot, SessionStore, Subscription};
pub use types::{AuthChange, AuthEvent, AuthResponse, Identity, OAuthProvider, OAuthRedirect, Session, SignUpMetadata};
