//! New-password page reached from a recovery email.
//!
//! SYSTEM CONTEXT
//! ==============
//! The recovery link returns here with a one-time `code`. The page exchanges
//! it for a session on load, then lets the user set a new password for that
//! session. Reaching the page without a code works for already signed-in
//! users; anyone else gets the provider's "session expired" error on submit.

use auth::CallbackParams;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::components::site_header::SiteHeader;
use crate::state::auth::AuthHandle;
use crate::util::auth::validate_new_password;

#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let location = use_location();
    let navigate = use_navigate();

    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let params = CallbackParams::from_query(&location.search.get_untracked());
    if let Some(description) = params.error_description.clone() {
        error.set(Some(description));
    }

    #[cfg(feature = "hydrate")]
    if let Some(code) = params.code.filter(|_| params.error_description.is_none()) {
        busy.set(true);
        leptos::task::spawn_local(async move {
            let result = match handle.get_untracked().store() {
                Ok(store) => store.exchange_code_for_session(&code).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                log::warn!("recovery code exchange failed: {e}");
                error.set(Some(e.user_message()));
            }
            busy.set(false);
        });
    }

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let new_password = match validate_new_password(&password.get(), &confirm.get()) {
            Ok(value) => value,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        error.set(None);
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                let result = match handle.get_untracked().store() {
                    Ok(store) => store.update_password(&new_password).await.map(|_| ()),
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => navigate(auth::guard::DASHBOARD_PATH, NavigateOptions::default()),
                    Err(e) => error.set(Some(e.user_message())),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, &navigate, new_password);
    };

    view! {
        <div class="auth-page">
            <SiteHeader/>
            <main class="auth-page__main">
                <form class="auth-card auth-form" on:submit=on_submit>
                    <h1 class="auth-card__title">"Choose a new password"</h1>
                    <Show when=move || error.get().is_some()>
                        <p class="auth-message auth-message--error">{move || error.get().unwrap_or_default()}</p>
                    </Show>
                    <label class="auth-form__label">
                        "New password"
                        <input
                            class="auth-input"
                            type="password"
                            autocomplete="new-password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="auth-form__label">
                        "Confirm new password"
                        <input
                            class="auth-input"
                            type="password"
                            autocomplete="new-password"
                            prop:value=move || confirm.get()
                            on:input=move |ev| confirm.set(event_target_value(&ev))
                        />
                    </label>
                    <button class="auth-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Saving..." } else { "Update password" }}
                    </button>
                </form>
            </main>
        </div>
    }
}
