//! Password-recovery request page.

use leptos::ev::SubmitEvent;
use leptos::prelude::*;

use crate::components::site_header::SiteHeader;
use crate::state::auth::AuthHandle;
use crate::util::auth::validate_email;

const RESET_LINK_SENT: &str = "Password reset link sent! Please check your email.";

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let handle = expect_context::<RwSignal<AuthHandle>>();

    let email = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let info = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let email_value = match validate_email(&email.get()) {
            Ok(value) => value,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        error.set(None);
        info.set(None);
        busy.set(true);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = match handle.get_untracked().store() {
                Ok(store) => store.reset_password_for_email(&email_value).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => info.set(Some(RESET_LINK_SENT.to_owned())),
                Err(e) => error.set(Some(e.user_message())),
            }
            busy.set(false);
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, email_value);
    };

    view! {
        <div class="auth-page">
            <SiteHeader/>
            <main class="auth-page__main">
                <form class="auth-card auth-form" on:submit=on_submit>
                    <h1 class="auth-card__title">"Forgot password"</h1>
                    <p class="auth-card__subtitle">"We'll email you a link to choose a new password"</p>
                    <Show when=move || error.get().is_some()>
                        <p class="auth-message auth-message--error">{move || error.get().unwrap_or_default()}</p>
                    </Show>
                    <Show when=move || info.get().is_some()>
                        <p class="auth-message auth-message--info">{move || info.get().unwrap_or_default()}</p>
                    </Show>
                    <label class="auth-form__label">
                        "Email"
                        <input
                            class="auth-input"
                            type="email"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </label>
                    <button class="auth-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Sending..." } else { "Send reset link" }}
                    </button>
                    <p class="auth-card__footer">
                        <a href="/login">"Back to login"</a>
                    </p>
                </form>
            </main>
        </div>
    }
}
