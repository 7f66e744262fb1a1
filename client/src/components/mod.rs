//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read shared state from Leptos context providers; pages compose
//! them per route.

pub mod auth_guard;
pub mod site_header;
