//! # client
//!
//! Leptos + WASM frontend for CourseHub.
//!
//! This crate contains the app shell, route guard component, auth pages and
//! the reactive bridge that mirrors `auth::SessionStore` snapshots into a
//! Leptos signal. Session logic itself lives in the `auth` crate.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// Browser entry point: hydrate the server-rendered shell.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
