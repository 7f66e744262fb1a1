//! Login page supporting password, magic-link and third-party sign-in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sign-in only dispatches to the session store. When the store commits the
//! new identity, the route guard moves the user on (to the carried
//! `redirect` location or the dashboard), so this page never navigates on
//! success. Errors from the identity service render inline.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use auth::{LoginContext, OAuthProvider};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::components::site_header::SiteHeader;
use crate::state::auth::AuthHandle;
use crate::util::auth::{validate_email, validate_password};

pub(crate) const MAGIC_LINK_SENT: &str = "Magic link sent! Please check your email.";

/// Third-party providers offered on the login form.
pub(crate) const LOGIN_PROVIDERS: [OAuthProvider; 2] = [OAuthProvider::Github, OAuthProvider::Google];

pub(crate) fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    Ok((validate_email(email)?, validate_password(password)?))
}

pub(crate) fn provider_button_label(provider: OAuthProvider) -> String {
    format!("Continue with {}", provider.label())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let handle = expect_context::<RwSignal<AuthHandle>>();
    let location = use_location();
    let context = Memo::new(move |_| LoginContext::from_query(&location.search.get()));

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let show_password = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let otp_email = RwSignal::new(String::new());
    let otp_error = RwSignal::new(None::<String>);
    let otp_info = RwSignal::new(None::<String>);
    let otp_busy = RwSignal::new(false);

    let on_sign_in = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_login_input(&email.get(), &password.get()) {
            Ok(values) => values,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        error.set(None);
        busy.set(true);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = match handle.get_untracked().store() {
                Ok(store) => store.sign_in(&email_value, &password_value).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                error.set(Some(e.user_message()));
            }
            busy.set(false);
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, email_value, password_value);
    };

    let on_send_link = move |ev: SubmitEvent| {
        ev.prevent_default();
        if otp_busy.get() {
            return;
        }
        let email_value = match validate_email(&otp_email.get()) {
            Ok(value) => value,
            Err(msg) => {
                otp_error.set(Some(msg.to_owned()));
                return;
            }
        };
        otp_error.set(None);
        otp_info.set(None);
        otp_busy.set(true);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = match handle.get_untracked().store() {
                Ok(store) => store.sign_in_with_otp(&email_value).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => otp_info.set(Some(MAGIC_LINK_SENT.to_owned())),
                Err(e) => otp_error.set(Some(e.user_message())),
            }
            otp_busy.set(false);
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, email_value);
    };

    let start_oauth = move |provider: OAuthProvider| {
        if busy.get_untracked() {
            return;
        }
        busy.set(true);
        error.set(None);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = match handle.get_untracked().store() {
                Ok(store) => store.sign_in_with_oauth(provider).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(redirect) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href(&redirect.url);
                    }
                }
                Err(e) => {
                    error.set(Some(e.user_message()));
                    busy.set(false);
                }
            }
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (handle, provider);
    };

    view! {
        <div class="auth-page">
            <SiteHeader/>
            <main class="auth-page__main">
                <div class="auth-card">
                    <h1 class="auth-card__title">"Login"</h1>
                    <p class="auth-card__subtitle">"Enter your credentials to access your account"</p>

                    <Show when=move || context.get().message.is_some()>
                        <p class="auth-message auth-message--info">
                            {move || context.get().message.unwrap_or_default()}
                        </p>
                    </Show>
                    <Show when=move || context.get().error.is_some()>
                        <p class="auth-message auth-message--error">
                            {move || context.get().error.unwrap_or_default()}
                        </p>
                    </Show>
                    <Show when=move || error.get().is_some()>
                        <p class="auth-message auth-message--error">{move || error.get().unwrap_or_default()}</p>
                    </Show>

                    <form class="auth-form" on:submit=on_sign_in>
                        <label class="auth-form__label">
                            "Email"
                            <input
                                class="auth-input"
                                type="email"
                                placeholder="your.email@example.com"
                                prop:value=move || email.get()
                                on:input=move |ev| email.set(event_target_value(&ev))
                            />
                        </label>
                        <label class="auth-form__label">
                            "Password"
                            <span class="auth-input-group">
                                <input
                                    class="auth-input"
                                    type=move || if show_password.get() { "text" } else { "password" }
                                    placeholder="password"
                                    prop:value=move || password.get()
                                    on:input=move |ev| password.set(event_target_value(&ev))
                                />
                                <button
                                    class="auth-input-group__toggle"
                                    type="button"
                                    on:click=move |_| show_password.update(|v| *v = !*v)
                                >
                                    {move || if show_password.get() { "Hide" } else { "Show" }}
                                </button>
                            </span>
                        </label>
                        <a class="auth-form__link" href="/forgot-password">"Forgot password?"</a>
                        <button class="auth-button" type="submit" disabled=move || busy.get()>
                            {move || if busy.get() { "Logging in..." } else { "Login with Password" }}
                        </button>
                    </form>

                    <div class="auth-divider">"Or"</div>

                    <form class="auth-form" on:submit=on_send_link>
                        <Show when=move || otp_error.get().is_some()>
                            <p class="auth-message auth-message--error">
                                {move || otp_error.get().unwrap_or_default()}
                            </p>
                        </Show>
                        <Show when=move || otp_info.get().is_some()>
                            <p class="auth-message auth-message--info">{move || otp_info.get().unwrap_or_default()}</p>
                        </Show>
                        <label class="auth-form__label">
                            "Email for magic link"
                            <input
                                class="auth-input"
                                type="email"
                                placeholder="your.email@example.com"
                                prop:value=move || otp_email.get()
                                on:input=move |ev| otp_email.set(event_target_value(&ev))
                            />
                        </label>
                        <button class="auth-button auth-button--secondary" type="submit" disabled=move || otp_busy.get()>
                            {move || if otp_busy.get() { "Sending..." } else { "Send Magic Link" }}
                        </button>
                    </form>

                    <div class="auth-divider">"Or continue with"</div>

                    <div class="auth-providers">
                        {LOGIN_PROVIDERS
                            .into_iter()
                            .map(|provider| {
                                view! {
                                    <button
                                        class="auth-button auth-button--provider"
                                        type="button"
                                        disabled=move || busy.get()
                                        on:click=move |_| start_oauth(provider)
                                    >
                                        {provider_button_label(provider)}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>

                    <p class="auth-card__footer">
                        "Don't have an account? "
                        <a href="/register">"Sign up"</a>
                    </p>
                </div>
            </main>
        </div>
    }
}
