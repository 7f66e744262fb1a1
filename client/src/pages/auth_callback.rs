//! Landing route for email-confirmation, magic-link and OAuth returns.
//!
//! The decision logic lives in `auth::resolve_callback`; this page feeds it
//! the full browser URL (errors may arrive in the fragment) and performs the
//! resulting navigation, replacing the callback entry in history.

use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::state::auth::{AuthHandle, AuthState};

/// Rendered outside `AuthGuard`: a service error redirects before the
/// initial session load finishes, and the code flow waits on the store.
#[component]
pub fn AuthCallbackPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let navigate = use_navigate();

    #[cfg(feature = "hydrate")]
    {
        use auth::callback::{self, CallbackStart};
        use auth::guard::LOGIN_PATH;

        let href = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default();
        let params = auth::CallbackParams::from_url(&href);
        let started = StoredValue::new(false);

        Effect::new(move |_| {
            if started.get_value() {
                return;
            }
            let replace = NavigateOptions { replace: true, ..NavigateOptions::default() };

            if let CallbackStart::Fail(target) = callback::start(&params) {
                log::warn!("auth callback returned an error: {:?}", params.error_description);
                started.set_value(true);
                navigate(&target.href(), replace);
                return;
            }

            match handle.with(AuthHandle::store) {
                Ok(store) => {
                    started.set_value(true);
                    let params = params.clone();
                    let navigate = navigate.clone();
                    leptos::task::spawn_local(async move {
                        let target = auth::resolve_callback(&store, params).await;
                        navigate(&target.href(), replace);
                    });
                }
                // Store creation failed; the app shell has stopped loading.
                Err(e) if !auth.with(|a| a.loading) => {
                    started.set_value(true);
                    let target = auth::Navigation::to(LOGIN_PATH).with_error(e.user_message());
                    navigate(&target.href(), replace);
                }
                Err(_) => {}
            }
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = (auth, handle, navigate);

    view! {
        <div class="auth-page">
            <main class="auth-page__main">
                <div class="auth-card auth-card--center" role="status">
                    <span class="spinner" aria-hidden="true"></span>
                    <h1 class="auth-card__title">"Completing authentication..."</h1>
                    <p class="auth-card__subtitle">"Please wait while we sign you in."</p>
                </div>
            </main>
        </div>
    }
}
