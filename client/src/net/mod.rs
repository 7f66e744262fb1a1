//! Networking modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` talks to the host server. Identity-service traffic goes through
//! `auth::GoTrueClient` directly from the browser.

pub mod api;
