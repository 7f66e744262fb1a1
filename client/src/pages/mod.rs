//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration and delegates rendering details
//! to `components`. Admission is handled by the `AuthGuard` wrapping each
//! route in `app`, never by the pages themselves.

pub mod auth_callback;
pub mod dashboard;
pub mod forgot_password;
pub mod home;
pub mod login;
pub mod register;
pub mod reset_password;
