//! Top navigation bar shared by every page.
//!
//! Shows login/register links to anonymous visitors and the dashboard link
//! plus sign-out to signed-in users. Nothing identity-dependent renders while
//! auth is loading.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::state::auth::{AuthHandle, AuthState};

/// Sign out, then navigate to `/login` once the provider call has resolved.
///
/// Navigation is explicit so the user is never left on a protected page
/// waiting for the guard to react.
pub(crate) fn spawn_sign_out<F>(handle: RwSignal<AuthHandle>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + 'static,
{
    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        match handle.get_untracked().store() {
            Ok(store) => {
                if let Err(e) = store.sign_out().await {
                    log::warn!("sign-out failed: {e}");
                }
            }
            Err(e) => log::warn!("sign-out unavailable: {e}"),
        }
        navigate(auth::guard::LOGIN_PATH, NavigateOptions::default());
    });
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (handle, navigate);
    }
}

#[component]
pub fn SiteHeader() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let navigate = use_navigate();

    let on_sign_out = move |_| spawn_sign_out(handle, navigate.clone());

    view! {
        <header class="site-header">
            <a class="site-header__brand" href="/">"CourseHub"</a>
            <nav class="site-header__nav">
                <Show when=move || !auth.get().loading>
                    {
                        let on_sign_out = on_sign_out.clone();
                        view! {
                    <Show
                        when=move || auth.get().user.is_some()
                        fallback=|| {
                            view! {
                                <a class="site-header__link" href="/login">"Login"</a>
                                <a class="site-header__link site-header__link--primary" href="/register">
                                    "Sign Up"
                                </a>
                            }
                        }
                    >
                        <a class="site-header__link" href="/dashboard">"Dashboard"</a>
                        <button class="site-header__link" type="button" on:click=on_sign_out.clone()>
                            "Sign Out"
                        </button>
                    </Show>
                        }
                    }
                </Show>
            </nav>
        </header>
    }
}
